use rocket::{serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    assign::{assign, share_links, AssignmentDraft, AssignmentOutcome},
    backend::Backend,
    config::Config,
    error::Result,
    model::assignment::{DepartmentResponses, PendingSurvey},
};

pub fn routes() -> Vec<Route> {
    routes![preview, create, pending, completed]
}

/// What the admin is asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct AssignmentPreview {
    ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_reason: Option<String>,
    message: String,
}

/// A pending survey with its fill link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingEntry {
    #[serde(flatten)]
    survey: PendingSurvey,
    link: String,
}

#[post("/surveys/assign/preview", data = "<draft>", format = "json")]
async fn preview(backend: Backend, draft: Json<AssignmentDraft>) -> Result<Json<AssignmentPreview>> {
    let vendors = backend.vendors().await?;
    let raters = backend.raters().await?;
    Ok(Json(AssignmentPreview {
        ready: draft.prepare().is_some(),
        skip_reason: draft.skip_reason().map(str::to_string),
        message: draft.confirmation_message(&vendors, &raters),
    }))
}

#[post("/surveys/assign", data = "<draft>", format = "json")]
async fn create(
    backend: Backend,
    config: &State<Config>,
    draft: Json<AssignmentDraft>,
) -> Result<Json<AssignmentOutcome>> {
    let outcome = assign(
        &*backend,
        &draft,
        config.dedupe_assignments(),
        config.public_url(),
    )
    .await?;
    Ok(Json(outcome))
}

#[get("/surveys/pending")]
async fn pending(backend: Backend, config: &State<Config>) -> Result<Json<Vec<PendingEntry>>> {
    let surveys = backend.pending_surveys().await?;
    let links = share_links(config.public_url(), &surveys);
    Ok(Json(
        surveys
            .into_iter()
            .zip(links)
            .map(|(survey, link)| PendingEntry {
                survey,
                link: link.url,
            })
            .collect(),
    ))
}

#[get("/surveys/completed")]
async fn completed(backend: Backend) -> Result<Json<Vec<DepartmentResponses>>> {
    Ok(Json(backend.responses_by_department().await?))
}

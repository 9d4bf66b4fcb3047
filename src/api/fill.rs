use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, PoisonError};

use rocket::{http::Status, serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    backend::Backend,
    config::Config,
    error::{Error, Result},
    fill::{FillSession, FillState, FillView, ThankYou, NOT_FOUND_MESSAGE},
    model::QuestionId,
};

pub fn routes() -> Vec<Route> {
    routes![fill_view, submit_fill, thank_you]
}

/// Tokens with a submit in flight, shared across requests.
#[derive(Debug, Default)]
pub struct SubmitGuard(Mutex<HashSet<String>>);

impl SubmitGuard {
    /// Claim `token` until the returned handle drops.
    pub fn acquire(&self, token: &str) -> Result<InFlight<'_>> {
        let mut tokens = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !tokens.insert(token.to_string()) {
            return Err(Error::Conflict(
                "This survey is already being submitted".to_string(),
            ));
        }
        Ok(InFlight {
            guard: self,
            token: token.to_string(),
        })
    }
}

/// A claimed token, released on drop.
pub struct InFlight<'a> {
    guard: &'a SubmitGuard,
    token: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.guard
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.token);
    }
}

/// Answers keyed by question ID.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillAnswers {
    #[serde(default)]
    pub answers: BTreeMap<QuestionId, String>,
}

#[get("/survey/fill/<token>")]
async fn fill_view(
    token: &str,
    backend: Backend,
    config: &State<Config>,
) -> (Status, Json<FillView>) {
    let session = FillSession::load(token, &*backend).await;
    let status = match session.state() {
        FillState::NotFound => Status::NotFound,
        _ => Status::Ok,
    };
    (status, Json(session.view(&config.sections())))
}

#[post("/survey/fill/<token>/submit", data = "<body>", format = "json")]
async fn submit_fill(
    token: &str,
    body: Json<FillAnswers>,
    backend: Backend,
    in_flight: &State<SubmitGuard>,
) -> Result<Json<ThankYou>> {
    let _claim = in_flight.acquire(token)?;

    // Unlike the page view, a failed fetch here stays a retryable error.
    let mut session = FillSession::fetch(token, &*backend).await?;
    if session.state() == FillState::NotFound {
        return Err(Error::not_found(NOT_FOUND_MESSAGE));
    }
    session.answer_all(body.into_inner().answers)?;
    session.submit(&*backend).await?;
    Ok(Json(ThankYou::default()))
}

#[get("/thankyou")]
fn thank_you() -> Json<ThankYou> {
    Json(ThankYou::default())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{serde_json, Value},
    };

    use super::*;
    use crate::{
        backend::{Backend, MemoryBackend, Outage, SurveyBackend},
        error::RETRY_MESSAGE,
        fill::THANK_YOU_MESSAGE,
        model::{assignment::AssignmentRequest, survey::SurveyStatus},
    };

    async fn assigned(backend: &MemoryBackend) -> String {
        let request = AssignmentRequest {
            vendor_id: 1,
            user_ids: vec![6],
            invited_by_user_id: 5,
            valid_days: 7,
        };
        backend.assign_multiple(&request).await.unwrap().remove(0).token
    }

    fn all_answers() -> FillAnswers {
        FillAnswers {
            answers: (2..=12).map(|id| (id, "Good".to_string())).collect(),
        }
    }

    async fn submit(client: &Client, token: &str, answers: &FillAnswers) -> Status {
        client
            .post(uri!(submit_fill(token)))
            .header(ContentType::JSON)
            .body(serde_json::to_string(answers).unwrap())
            .dispatch()
            .await
            .status()
    }

    #[rating_test(seeded)]
    async fn view_open_survey(client: Client, backend: MemoryBackend) {
        let token = assigned(&backend).await;
        let response = client.get(uri!(fill_view(token.as_str()))).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let view: Value = response.into_json().await.unwrap();
        assert_eq!(view["view"], "form");
        assert_eq!(view["vendor_name"], "Acme");
        assert_eq!(view["sections"].as_array().unwrap().len(), 4);
        let supplier = &view["sections"][0]["questions"][0];
        assert_eq!(supplier["value"], "Acme");
    }

    #[rating_test(seeded)]
    async fn view_unknown_token(client: Client) {
        let response = client.get(uri!(fill_view("nope"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let view: Value = response.into_json().await.unwrap();
        assert_eq!(view["message"], NOT_FOUND_MESSAGE);
    }

    #[rating_test(seeded)]
    async fn submit_then_gone(client: Client, backend: MemoryBackend) {
        let token = assigned(&backend).await;
        assert_eq!(Status::Ok, submit(&client, &token, &all_answers()).await);
        assert_eq!(backend.status_of(&token), Some(SurveyStatus::Completed));

        // The link is spent.
        let response = client.get(uri!(fill_view(token.as_str()))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
        let response = client
            .post(uri!(submit_fill(token.as_str())))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&all_answers()).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], NOT_FOUND_MESSAGE);
        assert_eq!(body["retryable"], false);
    }

    #[rocket::async_test]
    async fn submit_during_outage_is_retryable() {
        let memory = MemoryBackend::seeded();
        let token = assigned(&memory).await;
        let rocket = crate::rocket_with_backend(Backend::new(Outage::new(
            memory.clone(),
            &["survey_by_token"],
        )));
        let client = Client::tracked(rocket).await.unwrap();

        let response = client
            .post(uri!(submit_fill(token.as_str())))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&all_answers()).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::BadGateway, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], RETRY_MESSAGE);
        assert_eq!(body["retryable"], true);
        assert_eq!(memory.status_of(&token), Some(SurveyStatus::Pending));

        // Once the backend is back the same submit goes through.
        let client = Client::tracked(crate::rocket_with_backend(Backend::new(memory.clone())))
            .await
            .unwrap();
        assert_eq!(Status::Ok, submit(&client, &token, &all_answers()).await);
        assert_eq!(memory.status_of(&token), Some(SurveyStatus::Completed));
    }

    #[rating_test(seeded)]
    async fn incomplete_submit_is_rejected(client: Client, backend: MemoryBackend) {
        let token = assigned(&backend).await;
        let mut answers = all_answers();
        answers.answers.remove(&5);
        let response = client
            .post(uri!(submit_fill(token.as_str())))
            .header(ContentType::JSON)
            .body(serde_json::to_string(&answers).unwrap())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["missing_question_ids"], serde_json::json!([5]));
        assert_eq!(backend.status_of(&token), Some(SurveyStatus::Pending));
    }

    #[rating_test(seeded)]
    async fn foreign_question_is_rejected(client: Client, backend: MemoryBackend) {
        let token = assigned(&backend).await;
        let mut answers = all_answers();
        answers.answers.insert(99, "x".to_string());
        assert_eq!(
            Status::UnprocessableEntity,
            submit(&client, &token, &answers).await
        );
    }

    #[rating_test(seeded)]
    async fn concurrent_submit_conflicts(client: Client, backend: MemoryBackend) {
        let token = assigned(&backend).await;
        let guard = client.rocket().state::<SubmitGuard>().unwrap();
        let claim = guard.acquire(&token).unwrap();
        assert_eq!(Status::Conflict, submit(&client, &token, &all_answers()).await);
        assert_eq!(backend.status_of(&token), Some(SurveyStatus::Pending));

        drop(claim);
        assert_eq!(Status::Ok, submit(&client, &token, &all_answers()).await);
    }

    #[rating_test]
    async fn thank_you_page(client: Client) {
        let response = client.get(uri!(thank_you)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], THANK_YOU_MESSAGE);
    }
}

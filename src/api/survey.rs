use std::collections::BTreeMap;

use rocket::{serde::json::Json, Route, State};
use serde::{Deserialize, Serialize};

use crate::{
    backend::Backend,
    config::Config,
    error::{Error, Result},
    fill::ThankYou,
    form::{validate, RenderContext, SurveyForm, Validation},
    model::{answer::AnswerStore, survey::HeaderForm, QuestionId},
};

pub fn routes() -> Vec<Route> {
    routes![survey_form, submit_survey]
}

/// The self-serve survey together with how to draw it.
#[derive(Debug, Clone, Serialize)]
struct SurveyPage {
    context: RenderContext,
    #[serde(flatten)]
    form: SurveyForm,
}

/// A self-serve submission: personal information plus answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SelfServeSubmission {
    #[serde(default)]
    header: HeaderForm,
    #[serde(default)]
    answers: BTreeMap<QuestionId, String>,
}

#[get("/survey")]
async fn survey_form(backend: Backend, config: &State<Config>) -> Result<Json<SurveyPage>> {
    let questions = backend.questions().await?;
    let answers = AnswerStore::for_questions(&questions);
    Ok(Json(SurveyPage {
        context: RenderContext {
            theme: config.theme(),
        },
        form: SurveyForm::build(
            &questions,
            &config.sections(),
            HeaderForm::default(),
            &answers,
        ),
    }))
}

/// Check the self-serve form. Nothing is stored for it on the backend.
#[post("/survey/submit", data = "<submission>", format = "json")]
async fn submit_survey(
    submission: Json<SelfServeSubmission>,
    backend: Backend,
) -> Result<Json<ThankYou>> {
    let SelfServeSubmission { header, answers } = submission.into_inner();
    let questions = backend.questions().await?;
    let mut store = AnswerStore::for_questions(&questions);
    store.set_all(answers)?;
    if let Validation::Incomplete(incomplete) = validate(Some(&header), &questions, &store) {
        return Err(Error::Incomplete(incomplete));
    }
    info!(
        "Self-serve survey from {} accepted with {} answers",
        header.name.trim(),
        store.len()
    );
    Ok(Json(ThankYou::default()))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::{serde_json, Value},
    };

    use super::*;

    fn complete() -> SelfServeSubmission {
        SelfServeSubmission {
            header: HeaderForm::example(),
            answers: (1..=12).map(|id| (id, "3".to_string())).collect(),
        }
    }

    async fn post(client: &Client, submission: &SelfServeSubmission) -> (Status, Value) {
        let response = client
            .post(uri!(submit_survey))
            .header(ContentType::JSON)
            .body(serde_json::to_string(submission).unwrap())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json().await.unwrap())
    }

    #[rating_test(seeded)]
    async fn form_has_header_and_sections(client: Client) {
        let response = client.get(uri!(survey_form)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let page: Value = response.into_json().await.unwrap();
        assert_eq!(page["context"]["theme"], "light");
        assert_eq!(page["header"]["name"], "");
        let sections = page["sections"].as_array().unwrap();
        let titles: Vec<_> = sections.iter().map(|s| s["title"].as_str().unwrap()).collect();
        assert_eq!(
            titles,
            vec![
                "Supplier Information",
                "Quality of Product/Service",
                "Timeliness and On-Time Delivery",
                "Communication and Responsiveness",
            ]
        );
    }

    #[rating_test(seeded)]
    async fn complete_submission(client: Client) {
        let (status, body) = post(&client, &complete()).await;
        assert_eq!(Status::Ok, status);
        assert_eq!(body["title"], "Thank You!");
    }

    #[rating_test(seeded)]
    async fn missing_age(client: Client) {
        let mut submission = complete();
        submission.header.age = String::new();
        let (status, body) = post(&client, &submission).await;
        assert_eq!(Status::UnprocessableEntity, status);
        assert_eq!(body["missing_header_fields"], serde_json::json!(["age"]));
        assert!(body["error"].as_str().unwrap().contains("age"));
    }

    #[rating_test(seeded)]
    async fn unanswered_questions(client: Client) {
        let mut submission = complete();
        submission.answers.retain(|id, _| *id <= 10);
        let (status, body) = post(&client, &submission).await;
        assert_eq!(Status::UnprocessableEntity, status);
        assert_eq!(
            body["error"],
            "Please answer all required questions (2 missing)."
        );
    }
}

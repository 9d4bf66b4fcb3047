use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Serialize};

use super::SurveyBackend;
use crate::{
    error::{Error, Result},
    model::{
        answer::Submission,
        assignment::{AssignmentRequest, CreatedSurvey, DepartmentResponses, PendingSurvey},
        entity::{Department, NewDepartment, NewUser, NewVendor, User, Vendor, VendorSurveyDetails},
        question::Question,
        survey::SurveyInstance,
        DepartmentId, UserId, VendorId,
    },
};

/// Talks JSON to the REST backend under `base_url`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| Error::Validation(format!("Invalid backend URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Validation(format!(
                "Backend URL {base_url} cannot have a path"
            )));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The backend URL for `segments`, each percent-encoded as a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send the request and turn error statuses into [`Error`]s.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        let path = response.url().path().to_string();
        if status.is_success() {
            debug!("backend {path}: {status}");
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(&path, status, body))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let response = self.send(self.client.get(self.url(segments))).await?;
        Ok(response.json().await?)
    }

    async fn post<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<Response> {
        self.send(self.client.post(self.url(segments)).json(body)).await
    }

    async fn put<B: Serialize + ?Sized>(&self, segments: &[&str], body: &B) -> Result<()> {
        self.send(self.client.put(self.url(segments)).json(body)).await?;
        Ok(())
    }

    async fn delete(&self, segments: &[&str]) -> Result<()> {
        self.send(self.client.delete(self.url(segments))).await?;
        Ok(())
    }
}

/// Tokens that would not survive as a path segment of their own.
fn is_unroutable(token: &str) -> bool {
    matches!(token, "" | "." | "..")
}

/// Map a non-success backend status onto our error taxonomy.
fn status_error(path: &str, status: StatusCode, body: String) -> Error {
    match status {
        StatusCode::NOT_FOUND => Error::not_found(format!("{path} not found")),
        _ => Error::Backend {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[rocket::async_trait]
impl SurveyBackend for HttpBackend {
    async fn questions(&self) -> Result<Vec<Question>> {
        self.get(&["questions"]).await
    }

    async fn survey_by_token(&self, token: &str) -> Result<Option<SurveyInstance>> {
        if is_unroutable(token) {
            return Ok(None);
        }
        match self.get::<SurveyInstance>(&["survey", "fill", token]).await {
            // Some backends still serve closed instances; treat them as gone.
            Ok(instance) if instance.is_open_at(chrono::Utc::now()) => Ok(Some(instance)),
            Ok(_) | Err(Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn submit_survey(&self, token: &str, submission: &Submission) -> Result<()> {
        if is_unroutable(token) {
            return Err(Error::not_found(format!("Survey {token} not found")));
        }
        self.post(&["survey", "fill", token, "submit"], submission)
            .await?;
        Ok(())
    }

    async fn vendors(&self) -> Result<Vec<Vendor>> {
        self.get(&["vendor"]).await
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<()> {
        self.post(&["vendor"], vendor).await?;
        Ok(())
    }

    async fn update_vendor(&self, id: VendorId, vendor: &NewVendor) -> Result<()> {
        self.put(&["vendor", &id.to_string()], vendor).await
    }

    async fn delete_vendor(&self, id: VendorId) -> Result<()> {
        self.delete(&["vendor", &id.to_string()]).await
    }

    async fn vendor_survey_details(&self, id: VendorId) -> Result<VendorSurveyDetails> {
        self.get(&["vendor", &id.to_string(), "survey-details"]).await
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        self.get(&["department"]).await
    }

    async fn create_department(&self, department: &NewDepartment) -> Result<()> {
        self.post(&["department"], department).await?;
        Ok(())
    }

    async fn update_department(&self, id: DepartmentId, department: &NewDepartment) -> Result<()> {
        self.put(&["department", &id.to_string()], department).await
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<()> {
        self.delete(&["department", &id.to_string()]).await
    }

    async fn users(&self) -> Result<Vec<User>> {
        self.get(&["user"]).await
    }

    async fn create_user(&self, user: &NewUser) -> Result<()> {
        self.post(&["user"], user).await?;
        Ok(())
    }

    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<()> {
        self.put(&["user", &id.to_string()], user).await
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.delete(&["user", &id.to_string()]).await
    }

    async fn responses_by_department(&self) -> Result<Vec<DepartmentResponses>> {
        self.get(&["survey", "responses", "grouped-by-department"]).await
    }

    async fn assign_multiple(&self, request: &AssignmentRequest) -> Result<Vec<CreatedSurvey>> {
        let response = self.post(&["survey", "assign-multiple"], request).await?;
        Ok(response.json().await?)
    }

    async fn pending_surveys(&self) -> Result<Vec<PendingSurvey>> {
        self.get(&["survey", "pending"]).await
    }
}

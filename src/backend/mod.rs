//! The REST backend that owns vendors, users, departments and survey instances.

use std::ops::Deref;
use std::sync::Arc;

use rocket::{
    request::{self, FromRequest, Request},
    State,
};

use crate::{
    error::Result,
    model::{
        answer::Submission,
        assignment::{AssignmentRequest, CreatedSurvey, DepartmentResponses, PendingSurvey},
        entity::{Department, NewDepartment, NewUser, NewVendor, User, Vendor, VendorSurveyDetails},
        question::Question,
        survey::SurveyInstance,
        DepartmentId, UserId, VendorId,
    },
};

mod http;
mod memory;
#[cfg(test)]
mod outage;

pub use http::HttpBackend;
pub use memory::{vendor_evaluation, MemoryBackend};
#[cfg(test)]
pub(crate) use outage::Outage;

/// Everything the service needs from the backend.
///
/// Each call is one request with no retries. Mutations return nothing;
/// callers re-read the listing they changed.
#[rocket::async_trait]
pub trait SurveyBackend: Send + Sync {
    /// Questions of the self-serve survey.
    async fn questions(&self) -> Result<Vec<Question>>;

    /// Resolve a fill token. Unknown, expired and completed tokens give `None`.
    async fn survey_by_token(&self, token: &str) -> Result<Option<SurveyInstance>>;

    /// Record the answers and complete the instance.
    async fn submit_survey(&self, token: &str, submission: &Submission) -> Result<()>;

    async fn vendors(&self) -> Result<Vec<Vendor>>;
    async fn create_vendor(&self, vendor: &NewVendor) -> Result<()>;
    async fn update_vendor(&self, id: VendorId, vendor: &NewVendor) -> Result<()>;
    async fn delete_vendor(&self, id: VendorId) -> Result<()>;
    async fn vendor_survey_details(&self, id: VendorId) -> Result<VendorSurveyDetails>;

    async fn departments(&self) -> Result<Vec<Department>>;
    async fn create_department(&self, department: &NewDepartment) -> Result<()>;
    async fn update_department(&self, id: DepartmentId, department: &NewDepartment) -> Result<()>;
    async fn delete_department(&self, id: DepartmentId) -> Result<()>;

    async fn users(&self) -> Result<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> Result<()>;
    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<()>;
    async fn delete_user(&self, id: UserId) -> Result<()>;

    /// Completed surveys, grouped by the rater's department.
    async fn responses_by_department(&self) -> Result<Vec<DepartmentResponses>>;

    /// Create one pending instance and token per rater.
    async fn assign_multiple(&self, request: &AssignmentRequest) -> Result<Vec<CreatedSurvey>>;

    async fn pending_surveys(&self) -> Result<Vec<PendingSurvey>>;

    /// Users with the rater role.
    async fn raters(&self) -> Result<Vec<User>> {
        let users = self.users().await?;
        Ok(users.into_iter().filter(User::is_rater).collect())
    }
}

/// Shared handle on the configured backend, placed in managed state.
#[derive(Clone)]
pub struct Backend(Arc<dyn SurveyBackend>);

impl Backend {
    pub fn new(backend: impl SurveyBackend + 'static) -> Self {
        Self(Arc::new(backend))
    }
}

impl Deref for Backend {
    type Target = dyn SurveyBackend;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Backend {
    type Error = ();

    /// Get the backend from the managed state.
    ///
    /// Fails with `500` if no [`Backend`] is managed by [`rocket::Rocket`].
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        req.guard::<&State<Backend>>()
            .await
            .map(|backend| backend.inner().clone())
    }
}

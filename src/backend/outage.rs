use std::collections::HashSet;

use super::{MemoryBackend, SurveyBackend};
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

/// A [`MemoryBackend`] whose named operations answer `503`.
#[derive(Debug, Clone)]
pub struct Outage {
    inner: MemoryBackend,
    down: HashSet<&'static str>,
}

impl Outage {
    pub fn new(inner: MemoryBackend, down: &[&'static str]) -> Self {
        Self {
            inner,
            down: down.iter().copied().collect(),
        }
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.down.contains(operation) {
            return Err(Error::Backend {
                status: 503,
                message: format!("{operation} unavailable"),
            });
        }
        Ok(())
    }
}

#[rocket::async_trait]
impl SurveyBackend for Outage {
    async fn questions(&self) -> Result<Vec<Question>> {
        self.check("questions")?;
        self.inner.questions().await
    }

    async fn survey_by_token(&self, token: &str) -> Result<Option<SurveyInstance>> {
        self.check("survey_by_token")?;
        self.inner.survey_by_token(token).await
    }

    async fn submit_survey(&self, token: &str, submission: &Submission) -> Result<()> {
        self.check("submit_survey")?;
        self.inner.submit_survey(token, submission).await
    }

    async fn vendors(&self) -> Result<Vec<Vendor>> {
        self.check("vendors")?;
        self.inner.vendors().await
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<()> {
        self.check("create_vendor")?;
        self.inner.create_vendor(vendor).await
    }

    async fn update_vendor(&self, id: VendorId, vendor: &NewVendor) -> Result<()> {
        self.check("update_vendor")?;
        self.inner.update_vendor(id, vendor).await
    }

    async fn delete_vendor(&self, id: VendorId) -> Result<()> {
        self.check("delete_vendor")?;
        self.inner.delete_vendor(id).await
    }

    async fn vendor_survey_details(&self, id: VendorId) -> Result<VendorSurveyDetails> {
        self.check("vendor_survey_details")?;
        self.inner.vendor_survey_details(id).await
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        self.check("departments")?;
        self.inner.departments().await
    }

    async fn create_department(&self, department: &NewDepartment) -> Result<()> {
        self.check("create_department")?;
        self.inner.create_department(department).await
    }

    async fn update_department(&self, id: DepartmentId, department: &NewDepartment) -> Result<()> {
        self.check("update_department")?;
        self.inner.update_department(id, department).await
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<()> {
        self.check("delete_department")?;
        self.inner.delete_department(id).await
    }

    async fn users(&self) -> Result<Vec<User>> {
        self.check("users")?;
        self.inner.users().await
    }

    async fn create_user(&self, user: &NewUser) -> Result<()> {
        self.check("create_user")?;
        self.inner.create_user(user).await
    }

    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<()> {
        self.check("update_user")?;
        self.inner.update_user(id, user).await
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        self.check("delete_user")?;
        self.inner.delete_user(id).await
    }

    async fn responses_by_department(&self) -> Result<Vec<DepartmentResponses>> {
        self.check("responses_by_department")?;
        self.inner.responses_by_department().await
    }

    async fn assign_multiple(&self, request: &AssignmentRequest) -> Result<Vec<CreatedSurvey>> {
        self.check("assign_multiple")?;
        self.inner.assign_multiple(request).await
    }

    async fn pending_surveys(&self) -> Result<Vec<PendingSurvey>> {
        self.check("pending_surveys")?;
        self.inner.pending_surveys().await
    }
}

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

use super::SurveyBackend;
use crate::{
    error::{Error, Result},
    model::{
        answer::{Submission, SubmittedAnswer},
        assignment::{
            AssignmentRequest, CompletedSurvey, CreatedSurvey, DepartmentResponses, PendingSurvey,
        },
        entity::{
            CompletedRating, Department, DepartmentCore, NewDepartment, NewUser, NewVendor,
            PendingRating, Role, User, UserCore, Vendor, VendorCore, VendorSurveyDetails,
        },
        question::{Question, QuestionType},
        survey::{SurveyInstance, SurveyStatus},
        DepartmentId, UserId, VendorId,
    },
};

/// Length of generated fill tokens.
const TOKEN_LENGTH: usize = 32;

/// Department heading for raters without a department.
const NO_DEPARTMENT: &str = "Unassigned";

/// The twelve-question vendor evaluation served by the in-memory backend.
pub fn vendor_evaluation() -> Vec<Question> {
    let question = |id: i64, text: &str, kind: QuestionType| Question {
        id,
        text: text.to_string(),
        kind,
        order: id,
        options: Vec::new(),
    };
    vec![
        question(1, "Supplier Name", QuestionType::Text),
        question(2, "Product or service supplied", QuestionType::Paragraph),
        question(3, "Product quality", QuestionType::Rating),
        question(4, "Conformance to specification", QuestionType::Rating),
        question(5, "Defects found on receipt", QuestionType::Radio),
        question(6, "On-time delivery", QuestionType::Rating),
        question(7, "Lead time", QuestionType::Rating),
        question(8, "Delivery documentation complete", QuestionType::Radio),
        question(9, "Responsiveness", QuestionType::MultipleChoice),
        question(10, "Clarity of communication", QuestionType::MultipleChoice),
        question(11, "Problem resolution", QuestionType::MultipleChoice),
        question(12, "Additional comments", QuestionType::Paragraph),
    ]
}

/// One assignment of the survey, keyed by its token.
#[derive(Debug, Clone)]
struct Instance {
    vendor_id: VendorId,
    user_id: UserId,
    valid_until: DateTime<Utc>,
    status: SurveyStatus,
    answers: Vec<SubmittedAnswer>,
    submitted_at: Option<DateTime<Utc>>,
}

impl Instance {
    fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SurveyStatus::Pending && self.valid_until > now
    }
}

#[derive(Debug, Default)]
struct Store {
    questions: Vec<Question>,
    vendors: BTreeMap<VendorId, VendorCore>,
    departments: BTreeMap<DepartmentId, DepartmentCore>,
    users: BTreeMap<UserId, UserCore>,
    instances: HashMap<String, Instance>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn new_token(&self) -> String {
        loop {
            let token: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(TOKEN_LENGTH)
                .map(char::from)
                .collect();
            if !self.instances.contains_key(&token) {
                return token;
            }
        }
    }

    fn rater_name(&self, user_id: UserId) -> String {
        self.users
            .get(&user_id)
            .map(|u| u.full_name.clone())
            .unwrap_or_default()
    }

    fn vendor_name(&self, vendor_id: VendorId) -> String {
        self.vendors
            .get(&vendor_id)
            .map(|v| v.name.clone())
            .unwrap_or_default()
    }
}

/// A self-contained backend keeping everything in process memory.
///
/// Clones share the same store.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    /// An empty backend serving the given self-serve questions.
    pub fn new(questions: Vec<Question>) -> Self {
        let store = Store {
            questions,
            ..Store::default()
        };
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Demo data: the vendor evaluation, two vendors, two departments, an admin and three raters.
    pub fn seeded() -> Self {
        let backend = Self::new(vendor_evaluation());
        {
            let mut store = backend.lock();
            for (name, product_service) in [("Acme", "Fasteners"), ("Globex", "Logistics")] {
                let id = store.next_id();
                store.vendors.insert(
                    id,
                    VendorCore {
                        name: name.to_string(),
                        product_service: product_service.to_string(),
                    },
                );
            }
            let mut department_ids = Vec::new();
            for name in ["Procurement", "Operations"] {
                let id = store.next_id();
                store.departments.insert(id, DepartmentCore { name: name.to_string() });
                department_ids.push(id);
            }
            let admin_id = store.next_id();
            store.users.insert(
                admin_id,
                UserCore {
                    full_name: "Site Admin".to_string(),
                    email: "admin@example.com".to_string(),
                    role: Role::Admin,
                    department_id: None,
                    password: Some("change-me".to_string()),
                },
            );
            let raters = [
                ("Ravi Kumar", department_ids[0]),
                ("Mia Chen", department_ids[0]),
                ("Omar Haddad", department_ids[1]),
            ];
            for (name, department_id) in raters {
                let id = store.next_id();
                store.users.insert(
                    id,
                    UserCore {
                        full_name: name.to_string(),
                        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                        role: Role::Rater,
                        department_id: Some(department_id),
                        password: None,
                    },
                );
            }
        }
        backend
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Status of the instance behind `token`, whatever its state.
    pub fn status_of(&self, token: &str) -> Option<SurveyStatus> {
        self.lock().instances.get(token).map(|i| i.status)
    }

    /// Answers recorded for `token`, empty until it is submitted.
    pub fn answers_of(&self, token: &str) -> Vec<SubmittedAnswer> {
        self.lock()
            .instances
            .get(token)
            .map(|i| i.answers.clone())
            .unwrap_or_default()
    }

    /// Move the expiry of `token`. Returns false for unknown tokens.
    #[cfg(test)]
    pub fn set_valid_until(&self, token: &str, valid_until: DateTime<Utc>) -> bool {
        match self.lock().instances.get_mut(token) {
            Some(instance) => {
                instance.valid_until = valid_until;
                true
            }
            None => false,
        }
    }
}

#[rocket::async_trait]
impl SurveyBackend for MemoryBackend {
    async fn questions(&self) -> Result<Vec<Question>> {
        Ok(self.lock().questions.clone())
    }

    async fn survey_by_token(&self, token: &str) -> Result<Option<SurveyInstance>> {
        let store = self.lock();
        let instance = match store.instances.get(token) {
            Some(instance) if instance.is_open_at(Utc::now()) => instance,
            _ => return Ok(None),
        };
        let rater = store.users.get(&instance.user_id);
        Ok(Some(SurveyInstance {
            token: token.to_string(),
            rater_name: rater.map(|u| u.full_name.clone()).unwrap_or_default(),
            rater_email: rater.map(|u| u.email.clone()).unwrap_or_default(),
            vendor_name: store.vendor_name(instance.vendor_id),
            questions: store.questions.clone(),
            status: instance.status,
            valid_until: Some(instance.valid_until),
        }))
    }

    async fn submit_survey(&self, token: &str, submission: &Submission) -> Result<()> {
        let mut store = self.lock();
        let now = Utc::now();
        if let Some(unknown) = submission
            .answers
            .iter()
            .find(|a| !store.questions.iter().any(|q| q.id == a.question_id))
        {
            return Err(Error::BadRequest(format!(
                "Question {} is not part of this survey",
                unknown.question_id
            )));
        }
        let instance = store
            .instances
            .get_mut(token)
            .filter(|instance| instance.is_open_at(now))
            .ok_or_else(|| Error::not_found(format!("Survey {token} not found")))?;
        instance.status = SurveyStatus::Completed;
        instance.answers = submission.answers.clone();
        instance.submitted_at = Some(now);
        info!("Survey {token} completed with {} answers", submission.answers.len());
        Ok(())
    }

    async fn vendors(&self) -> Result<Vec<Vendor>> {
        Ok(self
            .lock()
            .vendors
            .iter()
            .map(|(id, vendor)| Vendor {
                vendor_id: *id,
                vendor: vendor.clone(),
            })
            .collect())
    }

    async fn create_vendor(&self, vendor: &NewVendor) -> Result<()> {
        let mut store = self.lock();
        let id = store.next_id();
        store.vendors.insert(id, vendor.clone());
        Ok(())
    }

    async fn update_vendor(&self, id: VendorId, vendor: &NewVendor) -> Result<()> {
        let mut store = self.lock();
        let existing = store
            .vendors
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Vendor {id} not found")))?;
        *existing = vendor.clone();
        Ok(())
    }

    async fn delete_vendor(&self, id: VendorId) -> Result<()> {
        let mut store = self.lock();
        store
            .vendors
            .remove(&id)
            .ok_or_else(|| Error::not_found(format!("Vendor {id} not found")))?;
        // Outstanding links for the vendor die with it; completed ratings stay.
        store
            .instances
            .retain(|_, i| i.vendor_id != id || i.status == SurveyStatus::Completed);
        Ok(())
    }

    async fn vendor_survey_details(&self, id: VendorId) -> Result<VendorSurveyDetails> {
        let store = self.lock();
        if !store.vendors.contains_key(&id) {
            return Err(Error::not_found(format!("Vendor {id} not found")));
        }
        let now = Utc::now();
        let mut details = VendorSurveyDetails::default();
        for instance in store.instances.values().filter(|i| i.vendor_id == id) {
            if let Some(submitted_at) = instance.submitted_at {
                details.completed.push(CompletedRating {
                    rater_name: store.rater_name(instance.user_id),
                    submitted_at,
                });
            } else if instance.is_open_at(now) {
                details.pending.push(PendingRating {
                    rater_name: store.rater_name(instance.user_id),
                });
            }
        }
        details.completed.sort_by_key(|c| c.submitted_at);
        details.pending.sort_by(|a, b| a.rater_name.cmp(&b.rater_name));
        Ok(details)
    }

    async fn departments(&self) -> Result<Vec<Department>> {
        Ok(self
            .lock()
            .departments
            .iter()
            .map(|(id, department)| Department {
                department_id: *id,
                department: department.clone(),
            })
            .collect())
    }

    async fn create_department(&self, department: &NewDepartment) -> Result<()> {
        let mut store = self.lock();
        let id = store.next_id();
        store.departments.insert(id, department.clone());
        Ok(())
    }

    async fn update_department(&self, id: DepartmentId, department: &NewDepartment) -> Result<()> {
        let mut store = self.lock();
        let existing = store
            .departments
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("Department {id} not found")))?;
        *existing = department.clone();
        Ok(())
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<()> {
        let mut store = self.lock();
        store
            .departments
            .remove(&id)
            .ok_or_else(|| Error::not_found(format!("Department {id} not found")))?;
        for user in store.users.values_mut() {
            if user.department_id == Some(id) {
                user.department_id = None;
            }
        }
        Ok(())
    }

    async fn users(&self) -> Result<Vec<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .map(|(id, user)| User {
                user_id: *id,
                user: user.clone(),
            })
            .collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<()> {
        let mut store = self.lock();
        let id = store.next_id();
        store.users.insert(id, user.clone());
        Ok(())
    }

    async fn update_user(&self, id: UserId, user: &NewUser) -> Result<()> {
        let mut store = self.lock();
        let existing = store
            .users
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("User {id} not found")))?;
        let password = user.password.clone().or_else(|| existing.password.take());
        *existing = UserCore {
            password,
            ..user.clone()
        };
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<()> {
        let mut store = self.lock();
        store
            .users
            .remove(&id)
            .ok_or_else(|| Error::not_found(format!("User {id} not found")))?;
        Ok(())
    }

    async fn responses_by_department(&self) -> Result<Vec<DepartmentResponses>> {
        let store = self.lock();
        let mut grouped: BTreeMap<String, Vec<CompletedSurvey>> = BTreeMap::new();
        for instance in store.instances.values() {
            let Some(submitted_at) = instance.submitted_at else {
                continue;
            };
            let department = store
                .users
                .get(&instance.user_id)
                .and_then(|u| u.department_id)
                .and_then(|id| store.departments.get(&id))
                .map_or(NO_DEPARTMENT.to_string(), |d| d.name.clone());
            grouped.entry(department).or_default().push(CompletedSurvey {
                rater_name: store.rater_name(instance.user_id),
                vendor_name: store.vendor_name(instance.vendor_id),
                submitted_at,
            });
        }
        Ok(grouped
            .into_iter()
            .map(|(department_name, mut surveys)| {
                surveys.sort_by_key(|s| s.submitted_at);
                DepartmentResponses {
                    department_name,
                    surveys,
                }
            })
            .collect())
    }

    async fn assign_multiple(&self, request: &AssignmentRequest) -> Result<Vec<CreatedSurvey>> {
        let mut store = self.lock();
        if request.user_ids.is_empty() {
            return Err(Error::BadRequest("No raters selected".to_string()));
        }
        if request.valid_days == 0 {
            return Err(Error::BadRequest("valid_days must be positive".to_string()));
        }
        if !store.vendors.contains_key(&request.vendor_id) {
            return Err(Error::not_found(format!(
                "Vendor {} not found",
                request.vendor_id
            )));
        }
        if let Some(missing) = request.user_ids.iter().find(|id| !store.users.contains_key(id)) {
            return Err(Error::not_found(format!("User {missing} not found")));
        }

        let valid_until = Utc::now()
            .checked_add_signed(Duration::days(request.valid_days.into()))
            .ok_or_else(|| Error::BadRequest("valid_days is out of range".to_string()))?;
        let mut created = Vec::with_capacity(request.user_ids.len());
        for &user_id in &request.user_ids {
            let token = store.new_token();
            store.instances.insert(
                token.clone(),
                Instance {
                    vendor_id: request.vendor_id,
                    user_id,
                    valid_until,
                    status: SurveyStatus::Pending,
                    answers: Vec::new(),
                    submitted_at: None,
                },
            );
            created.push(CreatedSurvey {
                user_id,
                token,
                valid_until: Some(valid_until),
            });
        }
        info!(
            "User {} assigned vendor {} to {} raters",
            request.invited_by_user_id,
            request.vendor_id,
            created.len()
        );
        Ok(created)
    }

    async fn pending_surveys(&self) -> Result<Vec<PendingSurvey>> {
        let store = self.lock();
        let now = Utc::now();
        let mut pending: Vec<_> = store
            .instances
            .iter()
            .filter(|(_, i)| i.is_open_at(now))
            .map(|(token, i)| PendingSurvey {
                rater_name: store.rater_name(i.user_id),
                vendor_name: store.vendor_name(i.vendor_id),
                valid_until: i.valid_until,
                token: token.clone(),
                vendor_id: Some(i.vendor_id),
                user_id: Some(i.user_id),
            })
            .collect();
        pending.sort_by(|a, b| {
            a.valid_until
                .cmp(&b.valid_until)
                .then_with(|| a.rater_name.cmp(&b.rater_name))
        });
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn request(user_ids: Vec<UserId>, valid_days: u32) -> AssignmentRequest {
        AssignmentRequest {
            vendor_id: 1,
            user_ids,
            invited_by_user_id: 5,
            valid_days,
        }
    }

    fn full_submission() -> Submission {
        Submission {
            answers: vendor_evaluation()
                .iter()
                .map(|q| SubmittedAnswer {
                    question_id: q.id,
                    answer: "3".to_string(),
                })
                .collect(),
        }
    }

    #[rocket::async_test]
    async fn seeded_contents() {
        let backend = MemoryBackend::seeded();
        assert_eq!(backend.vendors().await.unwrap().len(), 2);
        assert_eq!(backend.departments().await.unwrap().len(), 2);
        assert_eq!(backend.users().await.unwrap().len(), 4);
        assert_eq!(backend.raters().await.unwrap().len(), 3);
        assert_eq!(backend.questions().await.unwrap().len(), 12);
    }

    #[rocket::async_test]
    async fn assignment_fans_out() {
        let backend = MemoryBackend::seeded();
        let raters: Vec<_> = backend.raters().await.unwrap().iter().map(|u| u.user_id).collect();
        let before = Utc::now();
        let created = backend.assign_multiple(&request(raters.clone(), 7)).await.unwrap();
        let after = Utc::now();

        assert_eq!(created.len(), raters.len());
        let tokens: HashSet<_> = created.iter().map(|c| c.token.clone()).collect();
        assert_eq!(tokens.len(), raters.len());

        let mut rater_names = HashSet::new();
        for c in &created {
            let instance = backend.survey_by_token(&c.token).await.unwrap().unwrap();
            assert_eq!(instance.vendor_name, "Acme");
            let until = instance.valid_until.unwrap();
            assert!(until >= before + Duration::days(7) && until <= after + Duration::days(7));
            rater_names.insert(instance.rater_name);
        }
        assert_eq!(rater_names.len(), raters.len());
    }

    #[rocket::async_test]
    async fn submit_completes_exactly_once() {
        let backend = MemoryBackend::seeded();
        let created = backend.assign_multiple(&request(vec![6], 7)).await.unwrap();
        let token = &created[0].token;

        backend.submit_survey(token, &full_submission()).await.unwrap();
        assert_eq!(backend.status_of(token), Some(SurveyStatus::Completed));
        assert_eq!(backend.answers_of(token).len(), 12);

        // Closed for reading and for writing.
        assert!(backend.survey_by_token(token).await.unwrap().is_none());
        let second = backend.submit_survey(token, &full_submission()).await;
        assert!(matches!(second, Err(Error::NotFound(_))));
    }

    #[rocket::async_test]
    async fn expired_tokens_are_gone() {
        let backend = MemoryBackend::seeded();
        let created = backend.assign_multiple(&request(vec![6], 1)).await.unwrap();
        let token = &created[0].token;
        assert!(backend.set_valid_until(token, Utc::now() - Duration::minutes(1)));
        assert!(backend.survey_by_token(token).await.unwrap().is_none());
        assert!(backend.pending_surveys().await.unwrap().is_empty());
        assert!(backend.submit_survey(token, &full_submission()).await.is_err());
    }

    #[rocket::async_test]
    async fn rejects_bad_assignments() {
        let backend = MemoryBackend::seeded();
        assert!(matches!(
            backend.assign_multiple(&request(vec![], 7)).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            backend.assign_multiple(&request(vec![6], 0)).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            backend.assign_multiple(&request(vec![6], u32::MAX)).await,
            Err(Error::BadRequest(_))
        ));
        assert!(matches!(
            backend.assign_multiple(&request(vec![999], 7)).await,
            Err(Error::NotFound(_))
        ));
    }

    #[rocket::async_test]
    async fn foreign_answers_are_rejected() {
        let backend = MemoryBackend::seeded();
        let created = backend.assign_multiple(&request(vec![6], 7)).await.unwrap();
        let submission = Submission {
            answers: vec![SubmittedAnswer {
                question_id: 77,
                answer: "x".to_string(),
            }],
        };
        assert!(matches!(
            backend.submit_survey(&created[0].token, &submission).await,
            Err(Error::BadRequest(_))
        ));
        assert_eq!(backend.status_of(&created[0].token), Some(SurveyStatus::Pending));
    }

    #[rocket::async_test]
    async fn reports_after_submission() {
        let backend = MemoryBackend::seeded();
        let created = backend.assign_multiple(&request(vec![6, 7, 8], 7)).await.unwrap();
        backend
            .submit_survey(&created[0].token, &full_submission())
            .await
            .unwrap();

        let details = backend.vendor_survey_details(1).await.unwrap();
        assert_eq!(details.completed.len(), 1);
        assert_eq!(details.completed[0].rater_name, "Ravi Kumar");
        assert_eq!(details.pending.len(), 2);

        let grouped = backend.responses_by_department().await.unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].department_name, "Procurement");
        assert_eq!(grouped[0].surveys[0].vendor_name, "Acme");

        assert_eq!(backend.pending_surveys().await.unwrap().len(), 2);
    }

    #[rocket::async_test]
    async fn crud_round() {
        let backend = MemoryBackend::default();
        backend.create_department(&DepartmentCore::example()).await.unwrap();
        let department = backend.departments().await.unwrap().remove(0);

        backend
            .create_user(&UserCore::example_rater("Ravi Kumar", department.department_id))
            .await
            .unwrap();
        let user = backend.users().await.unwrap().remove(0);
        assert_eq!(user.department_id, Some(department.department_id));

        backend.delete_department(department.department_id).await.unwrap();
        let user = backend.users().await.unwrap().remove(0);
        assert_eq!(user.department_id, None);

        assert!(matches!(
            backend.update_vendor(42, &VendorCore::example()).await,
            Err(Error::NotFound(_))
        ));
        assert!(backend.delete_user(user.user_id).await.is_ok());
        assert!(backend.delete_user(user.user_id).await.is_err());
    }

    #[rocket::async_test]
    async fn editing_admin_keeps_password() {
        let backend = MemoryBackend::default();
        backend.create_user(&UserCore::example_admin()).await.unwrap();
        let admin = backend.users().await.unwrap().remove(0);
        let edit = UserCore {
            full_name: "Renamed".to_string(),
            password: None,
            ..UserCore::example_admin()
        };
        backend.update_user(admin.user_id, &edit).await.unwrap();
        let admin = backend.users().await.unwrap().remove(0);
        assert_eq!(admin.full_name, "Renamed");
        assert!(admin.password.is_some());
    }
}

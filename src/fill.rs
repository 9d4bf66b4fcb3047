//! Filling in an assigned survey through its token.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    backend::SurveyBackend,
    error::{Error, Result},
    form::{render_sections, validate, RenderedSection, SectionSpec, Validation, INSTRUCTIONS},
    model::{
        answer::{AnswerStore, Submission},
        survey::SurveyInstance,
        QuestionId,
    },
};

/// Shown instead of the form for unknown, expired and completed tokens.
pub const NOT_FOUND_MESSAGE: &str = "Survey not found or already completed.";

pub const THANK_YOU_TITLE: &str = "Thank You!";
pub const THANK_YOU_MESSAGE: &str = "Your survey has been submitted successfully.";

/// Questions whose text mentions one of these get the vendor name prefilled.
const VENDOR_NAME_HINTS: [&str; 2] = ["supplier", "company name"];

/// Where a fill session currently stands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillState {
    Loading,
    Loaded,
    NotFound,
    Submitting,
    Submitted,
    SubmitFailed,
}

/// One rater's pass over one survey instance.
#[derive(Debug, Clone)]
pub struct FillSession {
    token: String,
    state: FillState,
    instance: Option<SurveyInstance>,
    answers: AnswerStore,
}

impl FillSession {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            state: FillState::Loading,
            instance: None,
            answers: AnswerStore::default(),
        }
    }

    /// Fetch the instance behind `token` and prefill the vendor name.
    ///
    /// Unknown, expired and completed tokens end in [`FillState::NotFound`];
    /// a failed fetch is returned as is.
    pub async fn fetch(token: &str, backend: &dyn SurveyBackend) -> Result<Self> {
        let mut session = Self::new(token);
        match backend.survey_by_token(token).await? {
            Some(instance) => session.loaded(instance),
            None => {
                debug!("Survey {token} is unknown, expired or completed");
                session.state = FillState::NotFound;
            }
        }
        Ok(session)
    }

    /// Like [`Self::fetch`], but any failure to fetch ends in [`FillState::NotFound`].
    pub async fn load(token: &str, backend: &dyn SurveyBackend) -> Self {
        match Self::fetch(token, backend).await {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to fetch survey {token}: {e}");
                let mut session = Self::new(token);
                session.state = FillState::NotFound;
                session
            }
        }
    }

    fn loaded(&mut self, instance: SurveyInstance) {
        let mut answers = AnswerStore::for_questions(&instance.questions);
        for question in &instance.questions {
            if VENDOR_NAME_HINTS.iter().any(|hint| question.mentions(hint)) {
                // Ids come from the same question set, so this cannot fail.
                let _ = answers.set(question.id, instance.vendor_name.as_str());
            }
        }
        self.answers = answers;
        self.instance = Some(instance);
        self.state = FillState::Loaded;
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn state(&self) -> FillState {
        self.state
    }

    pub fn instance(&self) -> Option<&SurveyInstance> {
        self.instance.as_ref()
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    /// Record an answer while the form is editable.
    pub fn answer(&mut self, question_id: QuestionId, value: &str) -> Result<()> {
        self.ensure_editable()?;
        self.answers.set(question_id, value)
    }

    /// Record a batch of answers on top of the prefilled ones.
    pub fn answer_all(&mut self, answers: BTreeMap<QuestionId, String>) -> Result<()> {
        self.ensure_editable()?;
        self.answers.set_all(answers)
    }

    fn ensure_editable(&self) -> Result<()> {
        match self.state {
            FillState::Loaded | FillState::SubmitFailed => Ok(()),
            FillState::Submitting => Err(Error::Conflict(format!(
                "Survey {} is being submitted",
                self.token
            ))),
            FillState::Loading | FillState::NotFound | FillState::Submitted => {
                Err(Error::not_found(NOT_FOUND_MESSAGE))
            }
        }
    }

    /// Validate and move to [`FillState::Submitting`], returning the payload to send.
    ///
    /// An incomplete form stays where it was.
    pub fn begin_submit(&mut self) -> Result<Submission> {
        self.ensure_editable()?;
        let questions = self
            .instance
            .as_ref()
            .map(|i| i.questions.as_slice())
            .unwrap_or_default();
        if let Validation::Incomplete(incomplete) = validate(None, questions, &self.answers) {
            return Err(Error::Incomplete(incomplete));
        }
        self.state = FillState::Submitting;
        Ok(self.answers.to_submission())
    }

    /// Record the outcome of the backend write started by [`Self::begin_submit`].
    pub fn finish_submit(&mut self, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                info!("Survey {} submitted", self.token);
                self.state = FillState::Submitted;
                Ok(())
            }
            Err(e) => {
                warn!("Submitting survey {} failed: {e}", self.token);
                self.state = FillState::SubmitFailed;
                Err(e)
            }
        }
    }

    /// Validate, then send the answers in a single backend write.
    pub async fn submit(&mut self, backend: &dyn SurveyBackend) -> Result<()> {
        let submission = self.begin_submit()?;
        let result = backend.submit_survey(&self.token, &submission).await;
        self.finish_submit(result)
    }

    /// What the rater sees, given the section layout.
    pub fn view(&self, specs: &[SectionSpec]) -> FillView {
        match &self.instance {
            Some(instance) if self.state != FillState::NotFound => FillView::Form {
                token: self.token.clone(),
                rater_name: instance.rater_name.clone(),
                vendor_name: instance.vendor_name.clone(),
                valid_until: instance.valid_until,
                instructions: INSTRUCTIONS.to_string(),
                sections: render_sections(&instance.questions, specs, &self.answers),
                state: self.state,
            },
            _ => FillView::NotFound {
                message: NOT_FOUND_MESSAGE.to_string(),
            },
        }
    }
}

/// A fill session as handed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum FillView {
    Form {
        token: String,
        rater_name: String,
        vendor_name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        valid_until: Option<DateTime<Utc>>,
        instructions: String,
        sections: Vec<RenderedSection>,
        state: FillState,
    },
    NotFound {
        message: String,
    },
}

/// The confirmation shown after a successful submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThankYou {
    pub title: &'static str,
    pub message: &'static str,
}

impl Default for ThankYou {
    fn default() -> Self {
        Self {
            title: THANK_YOU_TITLE,
            message: THANK_YOU_MESSAGE,
        }
    }
}

use serde::Serialize;

use crate::model::{answer::AnswerStore, question::Question, survey::HeaderForm, QuestionId};

/// Why a form may not be submitted yet.
///
/// Both missing lists are always complete. `reason` reports the header
/// first, so when both parts are lacking the user is pointed at the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Incomplete {
    pub reason: String,
    pub missing_header_fields: Vec<&'static str>,
    pub missing_question_ids: Vec<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Complete,
    Incomplete(Incomplete),
}

impl Validation {
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Check that the header (if the form has one) and every question are answered.
pub fn validate(
    header: Option<&HeaderForm>,
    questions: &[Question],
    answers: &AnswerStore,
) -> Validation {
    let missing_header_fields = header.map(HeaderForm::missing_fields).unwrap_or_default();
    let missing_question_ids: Vec<_> = questions
        .iter()
        .filter(|q| !answers.is_answered(q.id))
        .map(|q| q.id)
        .collect();

    let reason = if !missing_header_fields.is_empty() {
        format!(
            "Please fill in all personal information fields (missing: {}).",
            missing_header_fields.join(", ")
        )
    } else if !missing_question_ids.is_empty() {
        format!(
            "Please answer all required questions ({} missing).",
            missing_question_ids.len()
        )
    } else {
        return Validation::Complete;
    };

    Validation::Incomplete(Incomplete {
        reason,
        missing_header_fields,
        missing_question_ids,
    })
}

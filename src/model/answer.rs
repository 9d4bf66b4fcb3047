use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{question::Question, QuestionId},
};

/// The rater's current answers during one fill session.
///
/// The store is bound to the question set it was created for and refuses
/// answers for any other question.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    questions: BTreeSet<QuestionId>,
    answers: BTreeMap<QuestionId, String>,
}

impl AnswerStore {
    /// Create an empty store for the given questions.
    pub fn for_questions<'a>(questions: impl IntoIterator<Item = &'a Question>) -> Self {
        Self {
            questions: questions.into_iter().map(|q| q.id).collect(),
            answers: BTreeMap::new(),
        }
    }

    /// Record an answer, replacing any previous one.
    pub fn set(&mut self, question_id: QuestionId, value: impl Into<String>) -> Result<()> {
        if !self.questions.contains(&question_id) {
            return Err(Error::Validation(format!(
                "Question {question_id} is not part of this survey"
            )));
        }
        self.answers.insert(question_id, value.into());
        Ok(())
    }

    /// Record every answer in `answers`, stopping at the first foreign question.
    pub fn set_all(&mut self, answers: BTreeMap<QuestionId, String>) -> Result<()> {
        for (question_id, value) in answers {
            self.set(question_id, value)?;
        }
        Ok(())
    }

    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    /// A question counts as answered only with a non-empty value.
    pub fn is_answered(&self, question_id: QuestionId) -> bool {
        self.get(question_id).map_or(false, |value| !value.is_empty())
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Answers in question ID order.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &str)> {
        self.answers.iter().map(|(id, value)| (*id, value.as_str()))
    }

    /// Build the write payload, ordered by question ID.
    pub fn to_submission(&self) -> Submission {
        Submission {
            answers: self
                .iter()
                .map(|(question_id, answer)| SubmittedAnswer {
                    question_id,
                    answer: answer.to_string(),
                })
                .collect(),
        }
    }
}

/// Body of `POST /survey/fill/{token}/submit` on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub answer: String,
}

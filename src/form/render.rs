//! Turns questions into input widget descriptors.
//!
//! Clients draw whatever widget they are given; the selection itself lives
//! in the [`AnswerStore`], never here.

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        answer::AnswerStore,
        question::{Question, QuestionType, COMMUNICATION_OPTIONS, RADIO_OPTIONS, RATING_OPTIONS},
        QuestionId,
    },
};

/// Colour scheme handed to the rendering layer explicitly.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Everything rendering needs besides the question and its answer.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    pub theme: Theme,
}

/// One selectable option of a single-select widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub label: String,
    pub selected: bool,
}

/// The input control for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    TextInput {
        multiline: bool,
        placeholder: String,
        value: String,
    },
    SingleSelect {
        choices: Vec<Choice>,
    },
}

/// A question ready to be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedQuestion {
    pub question_id: QuestionId,
    pub label: String,
    /// Whether the label carries the required marker.
    pub required: bool,
    #[serde(flatten)]
    pub widget: Widget,
}

/// The option labels a question offers, or `None` for free text and unknown types.
pub fn options_for(question: &Question) -> Option<Vec<String>> {
    let fixed: &[&str] = match question.kind {
        QuestionType::Rating => &RATING_OPTIONS,
        QuestionType::MultipleChoice => &COMMUNICATION_OPTIONS,
        QuestionType::Radio if !question.options.is_empty() => {
            return Some(question.options.clone());
        }
        QuestionType::Radio => &RADIO_OPTIONS,
        _ => return None,
    };
    Some(fixed.iter().map(|s| s.to_string()).collect())
}

/// Render one question with its current answer. Unknown types render nothing.
pub fn render(question: &Question, value: Option<&str>) -> Option<RenderedQuestion> {
    let value = value.unwrap_or_default();
    let widget = match &question.kind {
        QuestionType::Text => Widget::TextInput {
            multiline: false,
            placeholder: "Enter response".to_string(),
            value: value.to_string(),
        },
        QuestionType::Paragraph => Widget::TextInput {
            multiline: true,
            placeholder: "Enter detailed response".to_string(),
            value: value.to_string(),
        },
        QuestionType::Rating | QuestionType::MultipleChoice | QuestionType::Radio => {
            let choices = options_for(question)?
                .into_iter()
                .map(|label| Choice {
                    selected: label == value,
                    label,
                })
                .collect();
            Widget::SingleSelect { choices }
        }
        QuestionType::Unknown(_) => return None,
    };
    Some(RenderedQuestion {
        question_id: question.id,
        label: question.text.clone(),
        // The communication scale never showed the asterisk.
        required: question.kind != QuestionType::MultipleChoice,
        widget,
    })
}

/// Render every question in order against the store, skipping unknown types.
pub fn render_all<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    answers: &AnswerStore,
) -> Vec<RenderedQuestion> {
    questions
        .into_iter()
        .filter_map(|q| render(q, answers.get(q.id)))
        .collect()
}

/// Apply a widget change to the store.
pub fn on_change(answers: &mut AnswerStore, question_id: QuestionId, value: &str) -> Result<()> {
    answers.set(question_id, value)
}

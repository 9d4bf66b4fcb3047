use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::QuestionId;

/// Options offered for a `Rating` question.
pub const RATING_OPTIONS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// Options offered for a `MultipleChoice` (communication scale) question.
pub const COMMUNICATION_OPTIONS: [&str; 3] = ["Poor", "Average", "Good"];

/// Options offered for a `Radio` question when the backend provides none.
pub const RADIO_OPTIONS: [&str; 2] = ["Yes", "No"];

/// The kind of input a question expects.
///
/// Type names we do not recognise are kept as [`QuestionType::Unknown`] so
/// that a single odd question cannot break a whole survey.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    Paragraph,
    /// A 1 to 5 rating.
    Rating,
    /// Poor / Average / Good.
    MultipleChoice,
    /// Yes / No, or the backend's own options.
    Radio,
    /// Anything else.
    Unknown(String),
}

impl From<String> for QuestionType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Text" => Self::Text,
            "Paragraph" => Self::Paragraph,
            "Rating" => Self::Rating,
            "MultipleChoice" => Self::MultipleChoice,
            "Radio" => Self::Radio,
            _ => Self::Unknown(name),
        }
    }
}

impl From<QuestionType> for String {
    fn from(kind: QuestionType) -> Self {
        kind.to_string()
    }
}

impl Display for QuestionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Paragraph => "Paragraph",
            Self::Rating => "Rating",
            Self::MultipleChoice => "MultipleChoice",
            Self::Radio => "Radio",
            Self::Unknown(name) => name,
        };
        f.write_str(name)
    }
}

/// A single survey question, as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question unique ID.
    #[serde(rename = "question_id")]
    pub id: QuestionId,
    /// Question text shown to the rater.
    #[serde(rename = "question_text")]
    pub text: String,
    /// Input type.
    #[serde(rename = "question_type")]
    pub kind: QuestionType,
    /// Position used to group questions into sections.
    #[serde(rename = "question_order", default)]
    pub order: i64,
    /// Backend-provided options; empty for free-text questions.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub options: Vec<String>,
}

impl Question {
    /// Case-insensitive substring match on the question text.
    pub fn mentions(&self, needle: &str) -> bool {
        self.text.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// The backend sends `"options": null` for text questions.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;

    #[test]
    fn deserialize_backend_question() {
        let raw = r#"{
            "question_id": 5,
            "question_text": "Defects found on receipt",
            "question_type": "Radio",
            "question_order": 5,
            "options": ["Yes", "No", "Not applicable"]
        }"#;
        let question: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(question.id, 5);
        assert_eq!(question.kind, QuestionType::Radio);
        assert_eq!(question.options.len(), 3);
    }

    #[test]
    fn unknown_type_and_null_options() {
        let raw = r#"{
            "question_id": 9,
            "question_text": "Upload a photo",
            "question_type": "FileUpload",
            "options": null
        }"#;
        let question: Question = serde_json::from_str(raw).unwrap();
        assert_eq!(question.kind, QuestionType::Unknown("FileUpload".to_string()));
        assert!(question.options.is_empty());
        assert_eq!(question.order, 0);

        // The unknown name survives a trip back to the backend.
        let json = serde_json::to_value(&question).unwrap();
        assert_eq!(json["question_type"], "FileUpload");
    }

    #[test]
    fn mentions_ignores_case() {
        let question = Question::example(7, 1, "Supplier Name", QuestionType::Text);
        assert!(question.mentions("supplier"));
        assert!(question.mentions("NAME"));
        assert!(!question.mentions("company name"));
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::question::Question;

/// Lifecycle of one survey instance.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    /// Assigned, waiting for the rater.
    #[default]
    Pending,
    /// Submitted. Terminal.
    Completed,
}

/// One assignment of a survey to one rater for one vendor, as resolved from its token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurveyInstance {
    pub token: String,
    pub rater_name: String,
    pub rater_email: String,
    pub vendor_name: String,
    #[serde(rename = "survey_questions")]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub status: SurveyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl SurveyInstance {
    /// Whether a rater may still open and submit this instance.
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == SurveyStatus::Pending && self.valid_until.map_or(true, |until| until > now)
    }
}

/// Personal information collected at the top of the self-serve survey.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub place: String,
}

impl HeaderForm {
    /// Field names paired with their values, in display order.
    pub fn fields(&self) -> [(&'static str, &str); 5] {
        [
            ("name", self.name.as_str()),
            ("age", self.age.as_str()),
            ("date", self.date.as_str()),
            ("address", self.address.as_str()),
            ("place", self.place.as_str()),
        ]
    }

    /// Names of the fields whose trimmed value is empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{UserId, VendorId};

/// Body of `POST /survey/assign-multiple` on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRequest {
    pub vendor_id: VendorId,
    pub user_ids: Vec<UserId>,
    pub invited_by_user_id: UserId,
    pub valid_days: u32,
}

/// One survey instance created by an assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSurvey {
    #[serde(alias = "rater_user_id")]
    pub user_id: UserId,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

/// A survey instance still waiting for its rater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSurvey {
    pub rater_name: String,
    pub vendor_name: String,
    pub valid_until: DateTime<Utc>,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<VendorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

/// A submitted survey, as listed per department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSurvey {
    pub rater_name: String,
    pub vendor_name: String,
    pub submitted_at: DateTime<Utc>,
}

/// Completed surveys of the raters in one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentResponses {
    #[serde(alias = "name")]
    pub department_name: String,
    #[serde(default)]
    pub surveys: Vec<CompletedSurvey>,
}

/// A pending survey together with the link a rater opens it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
}

impl ShareLink {
    /// Build the fill link for `token` under the service's public URL.
    pub fn new(public_url: &str, token: &str) -> Self {
        Self {
            token: token.to_string(),
            url: format!("{}/survey/fill/{}", public_url.trim_end_matches('/'), token),
        }
    }
}

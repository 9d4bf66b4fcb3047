//! Handing a vendor's survey out to a set of raters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    backend::SurveyBackend,
    error::Result,
    model::{
        assignment::{AssignmentRequest, CreatedSurvey, DepartmentResponses, PendingSurvey, ShareLink},
        entity::{User, Vendor},
        UserId, VendorId,
    },
};

/// Used in the confirmation when the selected vendor is not in the listing.
const FALLBACK_VENDOR_NAME: &str = "Selected Vendor";

/// Longest validity an assignment may ask for, ten years.
pub const MAX_VALID_DAYS: u32 = 3650;

/// An assignment as picked in the admin form, possibly incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentDraft {
    #[serde(default)]
    pub vendor_id: Option<VendorId>,
    #[serde(default, alias = "user_ids")]
    pub rater_user_ids: BTreeSet<UserId>,
    pub invited_by_user_id: UserId,
    #[serde(default = "default_valid_days")]
    pub valid_days: u32,
}

fn default_valid_days() -> u32 {
    7
}

impl AssignmentDraft {
    /// The backend request, or `None` while the draft is not ready to send.
    pub fn prepare(&self) -> Option<AssignmentRequest> {
        let vendor_id = self.vendor_id?;
        if self.rater_user_ids.is_empty() || !(1..=MAX_VALID_DAYS).contains(&self.valid_days) {
            return None;
        }
        Some(AssignmentRequest {
            vendor_id,
            user_ids: self.rater_user_ids.iter().copied().collect(),
            invited_by_user_id: self.invited_by_user_id,
            valid_days: self.valid_days,
        })
    }

    /// Why [`Self::prepare`] declines, if it does.
    pub fn skip_reason(&self) -> Option<&'static str> {
        if self.vendor_id.is_none() {
            Some("No vendor selected")
        } else if self.rater_user_ids.is_empty() {
            Some("No raters selected")
        } else if self.valid_days == 0 {
            Some("Validity must be at least one day")
        } else if self.valid_days > MAX_VALID_DAYS {
            Some("Validity must be at most 3650 days")
        } else {
            None
        }
    }

    /// The question put to the admin before assigning.
    pub fn confirmation_message(&self, vendors: &[Vendor], raters: &[User]) -> String {
        let vendor = self
            .vendor_id
            .and_then(|id| vendors.iter().find(|v| v.vendor_id == id))
            .map_or(FALLBACK_VENDOR_NAME, |v| v.name.as_str());
        let names: Vec<_> = raters
            .iter()
            .filter(|u| self.rater_user_ids.contains(&u.user_id))
            .map(|u| u.full_name.as_str())
            .collect();
        format!(
            "Assign {vendor} survey to:\n{}\nValid for {} days?",
            names.join("\n"),
            self.valid_days
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// Nothing was sent.
    Skipped { reason: String },
    /// The backend created `created`; `completed` and `pending` are re-read
    /// afterwards and left empty when that refresh fails.
    Assigned {
        created: Vec<CreatedSurvey>,
        links: Vec<ShareLink>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        already_pending: Vec<UserId>,
        completed: Vec<DepartmentResponses>,
        pending: Vec<PendingSurvey>,
    },
}

/// Create one survey instance per rater, then refresh both listings.
///
/// Errors only when nothing was created.
///
/// With `dedupe`, raters who already hold a pending survey for the vendor
/// are left out.
pub async fn assign(
    backend: &dyn SurveyBackend,
    draft: &AssignmentDraft,
    dedupe: bool,
    public_url: &str,
) -> Result<AssignmentOutcome> {
    let mut request = match draft.prepare() {
        Some(request) => request,
        None => {
            let reason = draft.skip_reason().unwrap_or_default().to_string();
            debug!("Assignment skipped: {reason}");
            return Ok(AssignmentOutcome::Skipped { reason });
        }
    };

    let mut already_pending = Vec::new();
    if dedupe {
        let pending = backend.pending_surveys().await?;
        let holders: BTreeSet<_> = pending
            .iter()
            .filter(|p| p.vendor_id == Some(request.vendor_id))
            .filter_map(|p| p.user_id)
            .collect();
        let (held, free): (Vec<_>, Vec<_>) = request
            .user_ids
            .iter()
            .copied()
            .partition(|id| holders.contains(id));
        already_pending = held;
        request.user_ids = free;
        if request.user_ids.is_empty() {
            return Ok(AssignmentOutcome::Skipped {
                reason: "Every selected rater already has a pending survey for this vendor"
                    .to_string(),
            });
        }
    }

    let created = backend.assign_multiple(&request).await?;
    info!(
        "Assigned vendor {} to {} raters for {} days",
        request.vendor_id,
        created.len(),
        request.valid_days
    );
    let links = created
        .iter()
        .map(|c| ShareLink::new(public_url, &c.token))
        .collect();
    // Instances exist from here on, so refresh failures are not errors.
    let completed = backend
        .responses_by_department()
        .await
        .unwrap_or_else(|e| {
            warn!("Could not refresh completed surveys after assigning: {e}");
            Vec::new()
        });
    let pending = backend.pending_surveys().await.unwrap_or_else(|e| {
        warn!("Could not refresh pending surveys after assigning: {e}");
        Vec::new()
    });
    Ok(AssignmentOutcome::Assigned {
        created,
        links,
        already_pending,
        completed,
        pending,
    })
}

/// Fill links for every pending survey.
pub fn share_links(public_url: &str, pending: &[PendingSurvey]) -> Vec<ShareLink> {
    pending
        .iter()
        .map(|p| ShareLink::new(public_url, &p.token))
        .collect()
}

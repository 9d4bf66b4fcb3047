use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{DepartmentId, UserId, VendorId},
};

/// Core vendor data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCore {
    pub name: String,
    #[serde(default)]
    pub product_service: String,
}

impl VendorCore {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Vendor name is required".to_string()));
        }
        Ok(())
    }
}

/// A vendor without an ID.
pub type NewVendor = VendorCore;

/// A vendor from the backend, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: VendorId,
    #[serde(flatten)]
    pub vendor: VendorCore,
}

impl Deref for Vendor {
    type Target = VendorCore;

    fn deref(&self) -> &Self::Target {
        &self.vendor
    }
}

impl DerefMut for Vendor {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vendor
    }
}

/// Core department data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentCore {
    pub name: String,
}

impl DepartmentCore {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("Department name is required".to_string()));
        }
        Ok(())
    }
}

/// A department without an ID.
pub type NewDepartment = DepartmentCore;

/// A department from the backend, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: DepartmentId,
    #[serde(flatten)]
    pub department: DepartmentCore,
}

impl Deref for Department {
    type Target = DepartmentCore;

    fn deref(&self) -> &Self::Target {
        &self.department
    }
}

/// What a user may do.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Fills out surveys through tokenized links.
    #[default]
    #[field(value = "rater")]
    Rater,
    /// Manages vendors, users, departments and assignments.
    #[field(value = "admin")]
    Admin,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Rater, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Rater => "rater",
            Role::Admin => "admin",
        }
    }
}

/// Core user data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCore {
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    /// Only admins sign in, so only admins carry a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserCore {
    /// Check a user submitted through the admin form.
    /// Editing keeps the stored password when none is given.
    pub fn validate(&self, creating: bool) -> Result<()> {
        if self.full_name.trim().is_empty() {
            return Err(Error::Validation("Full name is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(Error::Validation("Email is required".to_string()));
        }
        let has_password = self.password.as_deref().map_or(false, |p| !p.is_empty());
        if creating && self.role == Role::Admin && !has_password {
            return Err(Error::Validation("Admins need a password".to_string()));
        }
        Ok(())
    }

    /// Raters never keep a password, whatever the form sent.
    pub fn normalized(mut self) -> Self {
        if self.role == Role::Rater || self.password.as_deref() == Some("") {
            self.password = None;
        }
        self
    }
}

/// A user without an ID.
pub type NewUser = UserCore;

/// A user from the backend, with its unique ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    #[serde(flatten)]
    pub user: UserCore,
}

impl User {
    pub fn is_rater(&self) -> bool {
        self.user.role == Role::Rater
    }
}

impl Deref for User {
    type Target = UserCore;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Ratings recorded against one vendor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSurveyDetails {
    #[serde(default)]
    pub completed: Vec<CompletedRating>,
    #[serde(default)]
    pub pending: Vec<PendingRating>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRating {
    pub rater_name: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRating {
    pub rater_name: String,
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::{self, json};

    use super::*;

    #[test]
    fn vendor_flattens_id() {
        let vendor = Vendor {
            vendor_id: 3,
            vendor: VendorCore::example(),
        };
        assert_eq!(
            serde_json::to_value(&vendor).unwrap(),
            json!({ "vendor_id": 3, "name": "Acme", "product_service": "Fasteners" })
        );
        assert_eq!(vendor.name, "Acme");
    }

    #[test]
    fn user_validation() {
        assert!(UserCore::example_rater("Ravi Kumar", 1).validate(true).is_ok());
        assert!(UserCore::example_admin().validate(true).is_ok());

        let admin = UserCore {
            password: None,
            ..UserCore::example_admin()
        };
        assert!(admin.validate(true).is_err());
        assert!(admin.validate(false).is_ok());

        let nameless = UserCore {
            full_name: " ".to_string(),
            ..UserCore::example_rater("x", 1)
        };
        assert!(nameless.validate(true).is_err());
    }

    #[test]
    fn raters_drop_passwords() {
        let rater = UserCore {
            password: Some("secret".to_string()),
            ..UserCore::example_rater("Ravi Kumar", 1)
        };
        assert_eq!(rater.normalized().password, None);
        assert!(UserCore::example_admin().normalized().password.is_some());
    }

    #[test]
    fn vendor_details_payload() {
        let raw = r#"{
            "completed": [{ "raterName": "Ravi", "submittedAt": "2024-03-01T10:00:00Z" }],
            "pending": [{ "raterName": "Mia" }]
        }"#;
        let details: VendorSurveyDetails = serde_json::from_str(raw).unwrap();
        assert_eq!(details.completed[0].rater_name, "Ravi");
        assert_eq!(details.pending[0].rater_name, "Mia");
    }
}

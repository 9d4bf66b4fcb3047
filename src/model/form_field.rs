use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::entity::{Department, Role, User, Vendor};

/// The value a select option submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One entry of a select field.
///
/// Option lists arrive either as bare strings or as `{label, value}`
/// objects; both are resolved into this type when the field is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChoiceOption {
    PlainLabel(String),
    LabeledValue { label: String, value: FieldValue },
}

impl ChoiceOption {
    pub fn label(&self) -> &str {
        match self {
            Self::PlainLabel(label) => label,
            Self::LabeledValue { label, .. } => label,
        }
    }

    /// A plain label submits itself.
    pub fn value(&self) -> FieldValue {
        match self {
            Self::PlainLabel(label) => FieldValue::Text(label.clone()),
            Self::LabeledValue { value, .. } => value.clone(),
        }
    }
}

/// How a form field is edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text {
        placeholder: String,
        #[serde(default)]
        secure: bool,
    },
    Select {
        options: Vec<ChoiceOption>,
        #[serde(default)]
        multiple: bool,
    },
}

/// One field of an admin modal form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FormField {
    pub fn text(name: &str, label: &str, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text {
                placeholder: placeholder.to_string(),
                secure: false,
            },
        }
    }

    pub fn secure(name: &str, label: &str, placeholder: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text {
                placeholder: placeholder.to_string(),
                secure: true,
            },
        }
    }

    pub fn select(name: &str, label: &str, options: Vec<ChoiceOption>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Select {
                options,
                multiple: false,
            },
        }
    }

    pub fn multi_select(name: &str, label: &str, options: Vec<ChoiceOption>) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Select {
                options,
                multiple: true,
            },
        }
    }
}

/// A titled set of fields, as shown in a modal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSchema {
    pub title: String,
    pub fields: Vec<FormField>,
}

pub fn vendor_form(editing: bool) -> FormSchema {
    FormSchema {
        title: if editing { "Edit Vendor" } else { "Create Vendor" }.to_string(),
        fields: vec![
            FormField::text("name", "Vendor Name", "Enter vendor name"),
            FormField::text("product_service", "Product/Service", "Enter product/service"),
        ],
    }
}

pub fn department_form(editing: bool) -> FormSchema {
    FormSchema {
        title: if editing { "Edit Department" } else { "Create Department" }.to_string(),
        fields: vec![FormField::text("name", "Department Name", "Enter name")],
    }
}

/// The password field only appears while the selected role is admin.
pub fn user_form(editing: bool, role: Role, departments: &[Department]) -> FormSchema {
    let roles = Role::ALL
        .iter()
        .map(|role| ChoiceOption::PlainLabel(role.as_str().to_string()))
        .collect();
    let departments = departments
        .iter()
        .map(|d| ChoiceOption::LabeledValue {
            label: d.name.clone(),
            value: FieldValue::Integer(d.department_id),
        })
        .collect();
    let mut fields = vec![
        FormField::text("full_name", "Full Name", "Enter full name"),
        FormField::text("email", "Email", "Enter email address"),
        FormField::select("role", "Role", roles),
        FormField::select("department_id", "Department", departments),
    ];
    if role == Role::Admin {
        fields.push(FormField::secure("password", "Password", "Enter password"));
    }
    FormSchema {
        title: if editing { "Edit User" } else { "Create User" }.to_string(),
        fields,
    }
}

/// Only raters are offered for assignment.
pub fn assignment_form(vendors: &[Vendor], users: &[User]) -> FormSchema {
    let vendors = vendors
        .iter()
        .map(|v| ChoiceOption::LabeledValue {
            label: v.name.clone(),
            value: FieldValue::Integer(v.vendor_id),
        })
        .collect();
    let raters = users
        .iter()
        .filter(|u| u.is_rater())
        .map(|u| ChoiceOption::LabeledValue {
            label: u.full_name.clone(),
            value: FieldValue::Integer(u.user_id),
        })
        .collect();
    FormSchema {
        title: "Assign Survey to Users".to_string(),
        fields: vec![
            FormField::select("vendor_id", "Select Vendor", vendors),
            FormField::multi_select("user_ids", "Select Users", raters),
            FormField::text("valid_days", "Valid For (Days)", "7"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json::{self, json};

    use super::*;
    use crate::model::entity::{DepartmentCore, UserCore, VendorCore};

    #[test]
    fn mixed_option_lists() {
        let raw = json!(["rater", { "label": "Procurement", "value": 4 }, { "label": "x", "value": "y" }]);
        let options: Vec<ChoiceOption> = serde_json::from_value(raw).unwrap();
        assert_eq!(options[0], ChoiceOption::PlainLabel("rater".to_string()));
        assert_eq!(options[0].value(), FieldValue::Text("rater".to_string()));
        assert_eq!(options[1].label(), "Procurement");
        assert_eq!(options[1].value(), FieldValue::Integer(4));
        assert_eq!(options[2].value().to_string(), "y");
    }

    #[test]
    fn password_only_for_admins() {
        let departments = vec![Department {
            department_id: 4,
            department: DepartmentCore::example(),
        }];
        let rater_form = user_form(false, Role::Rater, &departments);
        assert!(rater_form.fields.iter().all(|f| f.name != "password"));

        let admin_form = user_form(false, Role::Admin, &departments);
        let password = admin_form.fields.last().unwrap();
        assert_eq!(password.name, "password");
        assert!(matches!(password.kind, FieldKind::Text { secure: true, .. }));
    }

    #[test]
    fn assignment_form_lists_raters_only() {
        let vendors = vec![Vendor {
            vendor_id: 3,
            vendor: VendorCore::example(),
        }];
        let users = vec![
            User {
                user_id: 10,
                user: UserCore::example_rater("Ravi Kumar", 1),
            },
            User {
                user_id: 1,
                user: UserCore::example_admin(),
            },
        ];
        let form = assignment_form(&vendors, &users);
        match &form.fields[1].kind {
            FieldKind::Select { options, multiple } => {
                assert!(multiple);
                assert_eq!(options.len(), 1);
                assert_eq!(options[0].label(), "Ravi Kumar");
            }
            other => panic!("unexpected field kind {other:?}"),
        }

        let json = serde_json::to_value(&form.fields[2]).unwrap();
        assert_eq!(
            json,
            json!({ "name": "valid_days", "label": "Valid For (Days)", "type": "text", "placeholder": "7", "secure": false })
        );
    }
}

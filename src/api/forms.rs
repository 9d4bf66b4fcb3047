use rocket::{serde::json::Json, Route};

use crate::{
    backend::Backend,
    error::{Error, Result},
    model::{
        entity::Role,
        form_field::{assignment_form, department_form, user_form, vendor_form, FormSchema},
    },
};

pub fn routes() -> Vec<Route> {
    routes![form_schema]
}

/// Field layout of an admin modal. Select options are filled from the backend.
#[get("/forms/<kind>?<edit>&<role>")]
async fn form_schema(
    backend: Backend,
    kind: &str,
    edit: Option<bool>,
    role: Option<Role>,
) -> Result<Json<FormSchema>> {
    let editing = edit.unwrap_or(false);
    let schema = match kind {
        "vendor" => vendor_form(editing),
        "department" => department_form(editing),
        "user" => {
            let departments = backend.departments().await?;
            user_form(editing, role.unwrap_or_default(), &departments)
        }
        "assignment" => {
            let vendors = backend.vendors().await?;
            let users = backend.users().await?;
            assignment_form(&vendors, &users)
        }
        _ => return Err(Error::not_found(format!("Form {kind} not found"))),
    };
    Ok(Json(schema))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::Value,
    };

    use super::*;

    async fn fetch(client: &Client, uri: &str) -> (Status, Value) {
        let response = client.get(uri.to_string()).dispatch().await;
        let status = response.status();
        (status, response.into_json().await.unwrap())
    }

    fn field_names(schema: &Value) -> Vec<String> {
        schema["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[rating_test]
    async fn vendor_titles(client: Client) {
        let (status, schema) = fetch(&client, "/forms/vendor").await;
        assert_eq!(Status::Ok, status);
        assert_eq!(schema["title"], "Create Vendor");
        let (_, schema) = fetch(&client, "/forms/vendor?edit=true").await;
        assert_eq!(schema["title"], "Edit Vendor");
    }

    #[rating_test(seeded)]
    async fn password_only_for_admins(client: Client) {
        let (_, schema) = fetch(&client, "/forms/user").await;
        assert!(!field_names(&schema).contains(&"password".to_string()));
        let (_, schema) = fetch(&client, "/forms/user?role=admin").await;
        assert!(field_names(&schema).contains(&"password".to_string()));

        // Departments come from the backend.
        let departments = schema["fields"][3]["options"].as_array().unwrap();
        assert_eq!(departments.len(), 2);
        assert_eq!(departments[0]["label"], "Procurement");
    }

    #[rating_test(seeded)]
    async fn assignment_offers_raters(client: Client) {
        let (status, schema) = fetch(&client, "/forms/assignment").await;
        assert_eq!(Status::Ok, status);
        assert_eq!(schema["fields"][0]["options"].as_array().unwrap().len(), 2);
        assert_eq!(schema["fields"][1]["options"].as_array().unwrap().len(), 3);
        assert_eq!(schema["fields"][1]["multiple"], true);
    }

    #[rating_test]
    async fn unknown_form(client: Client) {
        let (status, _) = fetch(&client, "/forms/ballot").await;
        assert_eq!(Status::NotFound, status);
    }
}

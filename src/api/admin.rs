use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    backend::Backend,
    error::Result,
    model::{
        entity::{
            Department, NewDepartment, NewUser, NewVendor, User, Vendor, VendorSurveyDetails,
        },
        pagination::{Paginated, Pagination},
        DepartmentId, UserId, VendorId,
    },
};

pub fn routes() -> Vec<Route> {
    routes![
        get_vendors,
        create_vendor,
        update_vendor,
        delete_vendor,
        vendor_survey_details,
        get_departments,
        create_department,
        update_department,
        delete_department,
        get_users,
        create_user,
        update_user,
        delete_user,
        get_raters,
    ]
}

/// Passwords never leave the service.
fn without_password(mut user: User) -> User {
    user.user.password = None;
    user
}

#[get("/vendors")]
async fn get_vendors(backend: Backend, pagination: Pagination) -> Result<Json<Paginated<Vendor>>> {
    let vendors = backend.vendors().await?;
    Ok(Json(pagination.apply(vendors)))
}

#[post("/vendors", data = "<vendor>", format = "json")]
async fn create_vendor(backend: Backend, vendor: Json<NewVendor>) -> Result<Status> {
    vendor.validate()?;
    backend.create_vendor(&vendor).await?;
    info!("Created vendor {}", vendor.name);
    Ok(Status::Created)
}

#[put("/vendors/<vendor_id>", data = "<vendor>", format = "json")]
async fn update_vendor(
    backend: Backend,
    vendor_id: VendorId,
    vendor: Json<NewVendor>,
) -> Result<()> {
    vendor.validate()?;
    backend.update_vendor(vendor_id, &vendor).await
}

#[delete("/vendors/<vendor_id>")]
async fn delete_vendor(backend: Backend, vendor_id: VendorId) -> Result<()> {
    backend.delete_vendor(vendor_id).await?;
    info!("Deleted vendor {vendor_id}");
    Ok(())
}

#[get("/vendors/<vendor_id>/survey-details")]
async fn vendor_survey_details(
    backend: Backend,
    vendor_id: VendorId,
) -> Result<Json<VendorSurveyDetails>> {
    Ok(Json(backend.vendor_survey_details(vendor_id).await?))
}

#[get("/departments")]
async fn get_departments(
    backend: Backend,
    pagination: Pagination,
) -> Result<Json<Paginated<Department>>> {
    let departments = backend.departments().await?;
    Ok(Json(pagination.apply(departments)))
}

#[post("/departments", data = "<department>", format = "json")]
async fn create_department(backend: Backend, department: Json<NewDepartment>) -> Result<Status> {
    department.validate()?;
    backend.create_department(&department).await?;
    info!("Created department {}", department.name);
    Ok(Status::Created)
}

#[put("/departments/<department_id>", data = "<department>", format = "json")]
async fn update_department(
    backend: Backend,
    department_id: DepartmentId,
    department: Json<NewDepartment>,
) -> Result<()> {
    department.validate()?;
    backend.update_department(department_id, &department).await
}

#[delete("/departments/<department_id>")]
async fn delete_department(backend: Backend, department_id: DepartmentId) -> Result<()> {
    backend.delete_department(department_id).await?;
    info!("Deleted department {department_id}");
    Ok(())
}

#[get("/users")]
async fn get_users(backend: Backend, pagination: Pagination) -> Result<Json<Paginated<User>>> {
    let users = backend.users().await?;
    Ok(Json(
        pagination.apply(users.into_iter().map(without_password).collect()),
    ))
}

#[post("/users", data = "<user>", format = "json")]
async fn create_user(backend: Backend, user: Json<NewUser>) -> Result<Status> {
    user.validate(true)?;
    let user = user.into_inner().normalized();
    backend.create_user(&user).await?;
    info!("Created {} {}", user.role.as_str(), user.full_name);
    Ok(Status::Created)
}

#[put("/users/<user_id>", data = "<user>", format = "json")]
async fn update_user(backend: Backend, user_id: UserId, user: Json<NewUser>) -> Result<()> {
    user.validate(false)?;
    backend
        .update_user(user_id, &user.into_inner().normalized())
        .await
}

#[delete("/users/<user_id>")]
async fn delete_user(backend: Backend, user_id: UserId) -> Result<()> {
    backend.delete_user(user_id).await?;
    info!("Deleted user {user_id}");
    Ok(())
}

/// Every rater, unpaginated, for the assignment form.
#[get("/raters")]
async fn get_raters(backend: Backend) -> Result<Json<Vec<User>>> {
    let raters = backend.raters().await?;
    Ok(Json(raters.into_iter().map(without_password).collect()))
}

use rocket::Route;

mod admin;
mod assignment;
mod fill;
mod forms;
mod survey;

pub use fill::SubmitGuard;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(assignment::routes());
    routes.extend(fill::routes());
    routes.extend(forms::routes());
    routes.extend(survey::routes());
    routes
}

#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate rating_test;

use rocket::{Build, Rocket};

use crate::{
    api::SubmitGuard,
    backend::Backend,
    config::{BackendFairing, ConfigFairing},
    logging::LoggerFairing,
};

pub mod api;
pub mod assign;
pub mod backend;
pub mod config;
pub mod error;
pub mod fill;
pub mod form;
pub mod logging;
pub mod model;

/// The rating service, with the backend chosen by configuration.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(BackendFairing)
        .attach(LoggerFairing)
        .manage(SubmitGuard::default())
}

/// The rating service around an already built backend.
pub(crate) fn rocket_with_backend(backend: Backend) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(backend)
        .manage(SubmitGuard::default())
}

use std::time::Duration;

use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::{
    backend::{Backend, HttpBackend, MemoryBackend},
    form::{SectionSpec, Theme},
    model::pagination::DEFAULT_PAGE_SIZE,
};

/// Which backend the service talks to.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The REST backend at `backend_url`.
    #[default]
    Http,
    /// A seeded in-process store, for demos and local development.
    Memory,
}

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    backend: BackendKind,
    #[serde(default = "default_backend_url")]
    backend_url: String,
    #[serde(default = "default_request_timeout")]
    request_timeout: u64,
    #[serde(default = "default_public_url")]
    public_url: String,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    dedupe_assignments: bool,
    #[serde(default)]
    sections: Option<Vec<SectionSpec>>,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_backend_url() -> String {
    "http://localhost:5200/api".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_public_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            backend_url: default_backend_url(),
            request_timeout: default_request_timeout(),
            public_url: default_public_url(),
            theme: Theme::default(),
            dedupe_assignments: false,
            sections: None,
            page_size: default_page_size(),
        }
    }
}

impl Config {
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    /// Base URL of the REST backend, e.g. `http://localhost:5200/api`.
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Timeout for each backend request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Where raters reach this service. Share links are built on it.
    pub fn public_url(&self) -> &str {
        &self.public_url
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Leave out raters who already hold a pending survey for the vendor.
    pub fn dedupe_assignments(&self) -> bool {
        self.dedupe_assignments
    }

    /// The configured section layout, or the vendor evaluation layout.
    pub fn sections(&self) -> Vec<SectionSpec> {
        self.sections
            .clone()
            .unwrap_or_else(SectionSpec::default_layout)
    }

    /// Page size of admin listings when the request names none.
    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the backend fairing and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };
        if config.page_size == 0 {
            error!("`page_size` must be positive");
            return Err(rocket);
        }

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// A fairing that builds the configured backend and places a [`Backend`]
/// into managed state. Must be attached after [`ConfigFairing`].
pub struct BackendFairing;

#[rocket::async_trait]
impl Fairing for BackendFairing {
    fn info(&self) -> Info {
        Info {
            name: "Survey backend",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(config) = rocket.state::<Config>() else {
            error!("Backend fairing ran before the config was loaded");
            return Err(rocket);
        };
        let backend = match config.backend() {
            BackendKind::Http => {
                match HttpBackend::new(config.backend_url(), config.request_timeout()) {
                    Ok(http) => {
                        info!("Using survey backend at {}", http.base_url());
                        Backend::new(http)
                    }
                    Err(e) => {
                        error!("Failed to build HTTP client: {e}");
                        return Err(rocket);
                    }
                }
            }
            BackendKind::Memory => {
                warn!("Using the in-memory demo backend, nothing will be persisted");
                Backend::new(MemoryBackend::seeded())
            }
        };

        // Manage the state.
        rocket = rocket.manage(backend);
        Ok(rocket)
    }
}

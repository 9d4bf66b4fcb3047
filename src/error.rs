use rocket::{http::Status, response::Responder, serde::json::Json, Request};
use serde::Serialize;
use thiserror::Error;

use crate::{form::validate::Incomplete, model::QuestionId};

pub type Result<T> = std::result::Result<T, Error>;

/// Shown to users whenever the backend could not complete a request.
pub const RETRY_MESSAGE: &str = "The request could not be completed. Please try again.";

#[derive(Debug, Error)]
pub enum Error {
    /// A local check failed before anything was sent.
    #[error("{0}")]
    Validation(String),
    /// The survey form is missing answers or header fields.
    #[error("{}", .0.reason)]
    Incomplete(Incomplete),
    #[error("{0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Network(#[from] reqwest::Error),
    #[error("Backend responded {status}: {message}")]
    Backend { status: u16, message: String },
}

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Whether repeating the same action could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Backend { .. })
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Validation(_) | Self::Incomplete(_) => Status::UnprocessableEntity,
            Self::NotFound(_) => Status::NotFound,
            Self::Conflict(_) => Status::Conflict,
            Self::BadRequest(_) => Status::BadRequest,
            Self::Network(_) | Self::Backend { .. } => Status::BadGateway,
        }
    }
}

/// JSON error body returned to API clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_header_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_question_ids: Vec<QuestionId>,
}

impl From<&Error> for ErrorBody {
    fn from(error: &Error) -> Self {
        let (missing_header_fields, missing_question_ids) = match error {
            Error::Incomplete(incomplete) => (
                incomplete.missing_header_fields.clone(),
                incomplete.missing_question_ids.clone(),
            ),
            _ => (Vec::new(), Vec::new()),
        };
        // Backend details go to the log, not to the user.
        let message = if error.is_retryable() {
            RETRY_MESSAGE.to_string()
        } else {
            error.to_string()
        };
        Self {
            error: message,
            retryable: error.is_retryable(),
            missing_header_fields,
            missing_question_ids,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        (status, Json(ErrorBody::from(&self))).respond_to(req)
    }
}

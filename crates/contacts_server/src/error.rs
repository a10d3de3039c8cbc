use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use contacts_core::{ConflictKind, ContactServiceError, GatewayError};
use log::error;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::config::ConfigError;

pub const MISSING_ID: &str = "Missing id";
pub const INVALID_ID: &str = "Invalid id format";
pub const INVALID_REQUESTED_ID: &str = "Invalid _id format";
pub const INVALID_JSON: &str = "Request body must be valid JSON";
pub const INVALID_QUERY: &str = "Invalid query string";
pub const NOT_FOUND: &str = "Not found";
pub const DUPLICATE_EMAIL: &str = "A contact with that email already exists";
pub const DUPLICATE_ID: &str = "A contact with that id already exists";
pub const SERVER_ERROR: &str = "Server error";

/// JSON error body returned by every failing API call.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Request-level failure mapped onto an HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Conflict(ConflictKind),
    /// Logged with its operation, answered with a generic body.
    Internal {
        operation: &'static str,
        detail: String,
    },
}

impl ApiError {
    pub fn internal(operation: &'static str, detail: impl Display) -> Self {
        Self::Internal {
            operation,
            detail: detail.to_string(),
        }
    }

    /// Maps a service failure for `operation`.
    pub fn from_service(operation: &'static str, err: ContactServiceError) -> Self {
        match err {
            ContactServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            ContactServiceError::InvalidId(_) => Self::BadRequest(INVALID_ID.to_string()),
            ContactServiceError::InvalidRequestedId(_) => {
                Self::BadRequest(INVALID_REQUESTED_ID.to_string())
            }
            ContactServiceError::NotFound(_) => Self::NotFound,
            ContactServiceError::Conflict(kind) => Self::Conflict(kind),
            ContactServiceError::Store(err) => Self::internal(operation, err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(message) => message,
            Self::NotFound => NOT_FOUND,
            Self::Conflict(ConflictKind::Email) => DUPLICATE_EMAIL,
            Self::Conflict(ConflictKind::Id) => DUPLICATE_ID,
            Self::Internal { .. } => SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { operation, detail } = &self {
            error!(
                "event=request_failed module=api status=error operation=\"{operation}\" error={detail}"
            );
        }

        let body = ErrorBody {
            error: self.message().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Failure while bringing the server up.
#[derive(Debug)]
pub enum StartupError {
    Config(ConfigError),
    Logging(String),
    Store(GatewayError),
    Io(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "configuration error: {err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "server i/o failed: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Logging(_) => None,
        }
    }
}

impl From<ConfigError> for StartupError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<GatewayError> for StartupError {
    fn from(value: GatewayError) -> Self {
        Self::Store(value)
    }
}

impl From<std::io::Error> for StartupError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{ApiError, INVALID_ID, INVALID_REQUESTED_ID, SERVER_ERROR};
    use axum::http::StatusCode;
    use contacts_core::{
        parse_contact_id, ConflictKind, ContactServiceError, ContactValidationError, RepoError,
    };

    #[test]
    fn service_errors_map_to_statuses() {
        let cases = [
            (
                ContactServiceError::Validation(ContactValidationError::InvalidEmail),
                StatusCode::BAD_REQUEST,
            ),
            (
                ContactServiceError::from(parse_contact_id("nope").unwrap_err()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ContactServiceError::NotFound(uuid::Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (
                ContactServiceError::Conflict(ConflictKind::Email),
                StatusCode::CONFLICT,
            ),
            (
                ContactServiceError::Store(RepoError::InvalidData("corrupt".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from_service("test", err).status(), status);
        }
    }

    #[test]
    fn messages_never_leak_store_detail() {
        let err = ApiError::from_service(
            "test",
            ContactServiceError::Store(RepoError::InvalidData("secret detail".to_string())),
        );
        assert_eq!(err.message(), SERVER_ERROR);

        let err = ApiError::from_service(
            "test",
            ContactServiceError::InvalidRequestedId("x".to_string()),
        );
        assert_eq!(err.message(), INVALID_REQUESTED_ID);

        let err = ApiError::from_service(
            "test",
            ContactServiceError::from(parse_contact_id("x").unwrap_err()),
        );
        assert_eq!(err.message(), INVALID_ID);
    }
}

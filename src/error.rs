//! Application error model.
//!
//! Every failure in the service is an [`AppError`]: either an [`OperationalError`]
//! (expected, safe to describe to the client) or a defect carrying the original
//! error. Classification into a client-facing status/message happens in
//! [`AppError::classify`]; formatting happens in
//! [`crate::api::middleware::error_handler::ErrorNormalizer`].

use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Generic message shown for unclassified failures.
pub const GENERIC_MESSAGE: &str = "Something went wrong!";

/// An expected, classified failure.
#[derive(Debug)]
pub struct OperationalError {
    status: StatusCode,
    message: String,
    backtrace: Backtrace,
}

impl OperationalError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

#[derive(Debug)]
pub enum AppError {
    Operational(OperationalError),
    /// Anything not explicitly constructed as operational. Internal details stay server-side
    /// outside development mode.
    Defect(anyhow::Error),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Operational(OperationalError::new(status, message))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Operational(_))
    }

    /// Classifies the error into a client-facing status and message.
    ///
    /// Operational errors are used as-is. Defects are matched against the known
    /// collaborator error kinds anywhere in their source chain; a match becomes an
    /// operational classification with a sanitized message, anything else becomes
    /// a generic `500`.
    pub fn classify(&self) -> Classification<'_> {
        match self {
            Self::Operational(op) => Classification {
                status: op.status,
                message: op.message.clone(),
                is_operational: true,
                kind: ErrorKind::Operational,
                origin: None,
            },
            Self::Defect(err) => match classify_defect(err) {
                Some((kind, status, message)) => Classification {
                    status,
                    message,
                    is_operational: true,
                    kind,
                    origin: Some(err),
                },
                None => Classification {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: GENERIC_MESSAGE.to_string(),
                    is_operational: false,
                    kind: ErrorKind::Unclassified,
                    origin: Some(err),
                },
            },
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Defect(err.into())
    }
}

impl IntoResponse for AppError {
    /// Produces a marker response carrying the error in its extensions.
    ///
    /// The body is filled in by the error normalization middleware, which knows the
    /// deployment environment and the request kind.
    fn into_response(self) -> Response {
        let status = self.classify().status;
        let mut response = status.into_response();
        response.extensions_mut().insert(Arc::new(self));
        response
    }
}

/// Which rule classified an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Operational,
    MalformedId,
    DuplicateKey,
    Validation,
    InvalidCredential,
    ExpiredCredential,
    Unclassified,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Operational => "OperationalError",
            Self::MalformedId => "MalformedIdError",
            Self::DuplicateKey => "DuplicateKeyError",
            Self::Validation => "ValidationError",
            Self::InvalidCredential => "InvalidCredentialError",
            Self::ExpiredCredential => "ExpiredCredentialError",
            Self::Unclassified => "Error",
        }
    }
}

/// Result of [`AppError::classify`].
#[derive(Debug)]
pub struct Classification<'a> {
    pub status: StatusCode,
    pub message: String,
    pub is_operational: bool,
    pub kind: ErrorKind,
    /// The defect this classification was derived from, if any.
    pub origin: Option<&'a anyhow::Error>,
}

impl Classification<'_> {
    /// `"fail"` for client errors, `"error"` otherwise.
    pub fn status_label(&self) -> &'static str {
        if self.status.is_client_error() {
            "fail"
        } else {
            "error"
        }
    }
}

fn classify_defect(err: &anyhow::Error) -> Option<(ErrorKind, StatusCode, String)> {
    for cause in err.chain() {
        if let Some(persistence) = cause.downcast_ref::<PersistenceError>() {
            match persistence {
                PersistenceError::MalformedId { path, value } => {
                    return Some((
                        ErrorKind::MalformedId,
                        StatusCode::BAD_REQUEST,
                        format!("Invalid {path}: {value}."),
                    ));
                }
                PersistenceError::DuplicateKey { value, .. } => {
                    return Some((
                        ErrorKind::DuplicateKey,
                        StatusCode::BAD_REQUEST,
                        format!("Duplicate field value: {value}. Please use another value!"),
                    ));
                }
                PersistenceError::Validation { violations } => {
                    let messages: Vec<&str> =
                        violations.iter().map(|v| v.message.as_str()).collect();
                    return Some((
                        ErrorKind::Validation,
                        StatusCode::BAD_REQUEST,
                        format!("Invalid input data. {}", messages.join(". ")),
                    ));
                }
                PersistenceError::Driver(_) => return None,
            }
        }

        if let Some(credential) = cause.downcast_ref::<CredentialError>() {
            return Some(match credential {
                CredentialError::Invalid => (
                    ErrorKind::InvalidCredential,
                    StatusCode::UNAUTHORIZED,
                    "Invalid token. Please log in again!".to_string(),
                ),
                CredentialError::Expired => (
                    ErrorKind::ExpiredCredential,
                    StatusCode::UNAUTHORIZED,
                    "Your token has expired! Please log in again.".to_string(),
                ),
            });
        }
    }

    None
}

/// A single failed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Errors raised by the persistence collaborator.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Cast to ObjectId failed for value \"{value}\" at path \"{path}\"")]
    MalformedId { path: String, value: String },

    #[error("E11000 duplicate key error: {field} {value}")]
    DuplicateKey { field: String, value: String },

    #[error("validation failed: {violations:?}")]
    Validation { violations: Vec<FieldViolation> },

    #[error("driver error: {0}")]
    Driver(String),
}

/// Errors raised when a credential token cannot be accepted.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid signature")]
    Invalid,

    #[error("jwt expired")]
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operational_error_is_used_as_is() {
        let err = AppError::not_found("Can't find /foo on this server!");
        let class = err.classify();

        assert_eq!(class.status, StatusCode::NOT_FOUND);
        assert_eq!(class.message, "Can't find /foo on this server!");
        assert!(class.is_operational);
        assert_eq!(class.status_label(), "fail");
        assert!(class.origin.is_none());
    }

    #[test]
    fn test_malformed_id_is_classified() {
        let err: AppError = PersistenceError::MalformedId {
            path: "_id".to_string(),
            value: "abc".to_string(),
        }
        .into();
        let class = err.classify();

        assert_eq!(class.status, StatusCode::BAD_REQUEST);
        assert_eq!(class.message, "Invalid _id: abc.");
        assert_eq!(class.kind, ErrorKind::MalformedId);
        assert!(class.is_operational);
    }

    #[test]
    fn test_duplicate_key_is_classified() {
        let err: AppError = PersistenceError::DuplicateKey {
            field: "name".to_string(),
            value: "\"The Forest Hiker\"".to_string(),
        }
        .into();
        let class = err.classify();

        assert_eq!(class.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            class.message,
            "Duplicate field value: \"The Forest Hiker\". Please use another value!"
        );
    }

    #[test]
    fn test_validation_messages_are_joined() {
        let err: AppError = PersistenceError::Validation {
            violations: vec![
                FieldViolation {
                    field: "name".to_string(),
                    message: "A tour must have a name".to_string(),
                },
                FieldViolation {
                    field: "price".to_string(),
                    message: "A tour must have a price".to_string(),
                },
            ],
        }
        .into();
        let class = err.classify();

        assert_eq!(
            class.message,
            "Invalid input data. A tour must have a name. A tour must have a price"
        );
        assert_eq!(class.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_credential_errors_are_classified() {
        let invalid: AppError = CredentialError::Invalid.into();
        let expired: AppError = CredentialError::Expired.into();

        assert_eq!(invalid.classify().status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            invalid.classify().message,
            "Invalid token. Please log in again!"
        );
        assert_eq!(
            expired.classify().message,
            "Your token has expired! Please log in again."
        );
    }

    #[test]
    fn test_known_error_found_through_context() {
        let err: AppError = anyhow::Error::new(CredentialError::Expired)
            .context("loading current user")
            .into();

        assert_eq!(err.classify().kind, ErrorKind::ExpiredCredential);
    }

    #[test]
    fn test_unclassified_defect_is_generic() {
        let err: AppError = PersistenceError::Driver("connection reset by peer".to_string()).into();
        let class = err.classify();

        assert_eq!(class.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(class.message, GENERIC_MESSAGE);
        assert!(!class.is_operational);
        assert_eq!(class.status_label(), "error");
        assert!(class.origin.is_some());
    }

    #[test]
    fn test_into_response_carries_error() {
        let response = AppError::too_many_requests("slow down").into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.extensions().get::<Arc<AppError>>().is_some());
    }
}

use crate::db::errors::DbError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

pub const MISSING_CREDENTIAL_MESSAGE: &str = "Missing or invalid token";
pub const TOKEN_VERIFICATION_FAILED_MESSAGE: &str = "Token verification failed";
pub const FORBIDDEN_MESSAGE: &str = "Access denied: insufficient permissions";

#[derive(ThisError, Debug)]
pub enum Error {
    /// No bearer credential on a request that needs one
    #[error("Missing bearer credential")]
    MissingCredential,

    /// Credential present but rejected (bad token, bad password)
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated, but the caller's role does not grant the operation
    #[error("Forbidden")]
    Forbidden { message: Option<String> },

    /// A route asked for a permission the permission table does not know about
    #[error("Unknown permission {name}")]
    UnknownPermission { name: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{message}")]
    NotFound { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Conflict error, e.g., for unique constraint violations
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

/// JSON body for every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingCredential | Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::UnknownPermission { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Conflict { .. } => StatusCode::CONFLICT,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::MissingCredential => MISSING_CREDENTIAL_MESSAGE.to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| TOKEN_VERIFICATION_FAILED_MESSAGE.to_string()),
            Error::Forbidden { message } => message.clone().unwrap_or_else(|| FORBIDDEN_MESSAGE.to_string()),
            Error::UnknownPermission { .. } => "Internal server error".to_string(),
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { message } => message.clone(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, table, .. } => match (table.as_deref(), constraint.as_deref()) {
                    (Some("users"), Some(c)) if c.contains("email") => "User already exists.".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
            Error::Conflict { message } => message.clone(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::UnknownPermission { name } => {
                tracing::error!(permission = %name, "Route guarded by a permission missing from the permission table");
            }
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::MissingCredential | Error::Unauthenticated { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let body = ErrorBody {
            message: self.user_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(error: Error) -> (StatusCode, ErrorBody) {
        let response = error.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_auth_error_bodies() {
        let (status, body) = body_of(Error::MissingCredential).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "Missing or invalid token");

        let (status, body) = body_of(Error::Unauthenticated { message: None }).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.message, "Token verification failed");

        let (status, body) = body_of(Error::Forbidden { message: None }).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body.message, "Access denied: insufficient permissions");
    }

    #[tokio::test]
    async fn test_server_faults_do_not_leak_details() {
        let (status, body) = body_of(Error::UnknownPermission {
            name: "FEED_PETS".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.message, "Internal server error");

        let (status, body) = body_of(Error::Other(anyhow::anyhow!("connection reset by peer"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("connection reset"));
    }

    #[test]
    fn test_unique_email_violation_message() {
        let err = Error::Database(DbError::UniqueViolation {
            constraint: Some("users_email_key".to_string()),
            table: Some("users".to_string()),
            message: "duplicate key value violates unique constraint".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "User already exists.");
    }
}

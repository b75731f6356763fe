/// Unified error types for the admin gate
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for privileged operations
#[derive(Error, Debug)]
pub enum AdminError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// No session, or the session could not be resolved
    #[error("Authentication required: {0}")]
    AuthenticationRequired(String),

    /// Session present but role, status or permission is insufficient
    #[error("Not authorized: {0}")]
    AuthorizationDenied(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict errors (duplicate pending invitation, email already administered)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invitation matched but is past its expiry
    #[error("Access code has expired")]
    Expired,

    /// No pending invitation matched the email and code
    #[error("Invalid access code")]
    InvalidAccessCode,

    /// Rate limiting errors
    #[error("Rate limit exceeded")]
    RateLimitExceeded { retry_after: std::time::Duration },

    /// Password hashing collaborator failures
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Dependency failures are never shown to callers
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            AdminError::Database(_)
                | AdminError::Hashing(_)
                | AdminError::Internal(_)
                | AdminError::Io(_)
        )
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Convert AdminError to HTTP response
impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            // Both authentication and authorization failures read the same to callers
            AdminError::AuthenticationRequired(_) => (
                StatusCode::UNAUTHORIZED,
                "AuthenticationRequired",
                "Not authorized".to_string(),
            ),
            AdminError::AuthorizationDenied(_) => (
                StatusCode::FORBIDDEN,
                "Forbidden",
                "Not authorized".to_string(),
            ),
            AdminError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "InvalidRequest",
                self.to_string(),
            ),
            AdminError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound", self.to_string()),
            AdminError::Conflict(_) => (StatusCode::CONFLICT, "Conflict", self.to_string()),
            AdminError::Expired => (
                StatusCode::UNAUTHORIZED,
                "ExpiredAccessCode",
                self.to_string(),
            ),
            AdminError::InvalidAccessCode => (
                StatusCode::UNAUTHORIZED,
                "InvalidAccessCode",
                self.to_string(),
            ),
            AdminError::RateLimitExceeded { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimitExceeded",
                "Rate limit exceeded".to_string(),
            ),
            AdminError::Database(_)
            | AdminError::Hashing(_)
            | AdminError::Internal(_)
            | AdminError::Io(_) => {
                tracing::error!(error = %self, "request failed on a dependency");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalServerError",
                    "Internal server error".to_string(), // Don't leak details
                )
            }
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                error: error_code.to_string(),
                message,
            }),
        )
            .into_response();

        if let AdminError::RateLimitExceeded { retry_after } = self {
            if let Ok(value) = retry_after.as_secs().max(1).to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

/// Result type alias for admin operations
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failures_share_message() {
        let authn = AdminError::AuthenticationRequired("no session".into()).into_response();
        let authz = AdminError::AuthorizationDenied("viewer".into()).into_response();

        assert_eq!(authn.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(authz.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_dependency_failures_are_opaque() {
        let err = AdminError::Internal("disk on fire".into());
        assert!(err.is_dependency_failure());
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        assert!(!AdminError::Expired.is_dependency_failure());
        assert!(!AdminError::InvalidAccessCode.is_dependency_failure());
    }

    #[test]
    fn test_rate_limit_sets_retry_after() {
        let response = AdminError::RateLimitExceeded {
            retry_after: std::time::Duration::from_secs(30),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "30");
    }
}

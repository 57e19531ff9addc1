//! Error types for the LocalLibrary server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Anonymous access to a protected route. Resolved as a redirect to the
    /// login page, not as an error payload.
    #[error("Authentication required")]
    AuthRequired { location: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Field-level validation failures, keyed by field name.
    #[error("Validation failed")]
    InvalidFields(#[from] validator::ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// Per-field validation messages, present for field-level failures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message, fields) = match self {
            AppError::AuthRequired { location } => {
                return Redirect::to(&location).into_response();
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, "authentication_error", msg, None)
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, "authorization_error", msg, None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg, None),
            AppError::InvalidFields(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Validation failed".to_string(),
                serde_json::to_value(&errors).ok(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg, None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Authentication("bad credentials".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Authorization("missing capability".into())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("Author 42 not found".into())
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("bad page".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("duplicate".into()).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_required_redirects_to_login() {
        let resp = AppError::AuthRequired {
            location: "/accounts/login?next=/catalog/mybooks".to_string(),
        }
        .into_response();

        assert!(resp.status().is_redirection());
        assert_eq!(
            resp.headers().get(LOCATION).unwrap(),
            "/accounts/login?next=/catalog/mybooks"
        );
    }

    #[test]
    fn test_field_errors_map_to_bad_request() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("renewal_in_past");
        err.message = Some("Invalid date - renewal in the past.".into());
        errors.add("renewal_date", err);

        let resp = AppError::InvalidFields(errors).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

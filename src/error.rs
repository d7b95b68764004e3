use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use validator::{ValidationError, ValidationErrors};

/// Result type for handler and service operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// ApiError
///
/// The application's error taxonomy. Every failure a request can surface is one of
/// these variants, and the single `IntoResponse` implementation below is the only
/// place errors are translated to HTTP. This keeps the policy uniform across all
/// listing and mutation operations: lookups that miss are 404, payloads that fail
/// validation are 400 with field-level detail, identity failures are 401, and
/// authorship failures are 403.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Database operation failed. Details are logged, never sent to the client.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Payload validation failed; carries per-field errors so the client can
    /// re-render its form.
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    /// The addressed resource (post, group, author) does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The request carried no usable identity.
    #[error("unauthorized")]
    Unauthorized,

    /// The acting user is authenticated but not allowed to perform the operation.
    #[error("{0}")]
    Forbidden(&'static str),
}

impl ApiError {
    /// invalid_field
    ///
    /// Builds a single-field validation failure for checks that live outside the
    /// derive-based payload validation, such as resolving a group slug. The result
    /// is shaped exactly like a derive-produced error so clients handle both the
    /// same way.
    pub fn invalid_field(field: &'static str, message: &'static str) -> Self {
        let mut error = ValidationError::new(field);
        error.message = Some(message.into());
        let mut errors = ValidationErrors::new();
        errors.add(field, error);
        ApiError::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        let body = match &self {
            ApiError::Database(e) => {
                // Full detail for operators, generic message for clients.
                tracing::error!("database error: {:?}", e);
                serde_json::json!({
                    "error": "internal server error",
                    "status": status.as_u16(),
                })
            }
            ApiError::Validation(errors) => serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
                "fields": errors,
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
                "status": status.as_u16(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

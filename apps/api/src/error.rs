//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Mostrador                              │
//! │                                                                         │
//! │  Handler → Result<T, ApiError>                                         │
//! │     │                                                                   │
//! │     ├── ValidationError ────────────────► 400 VALIDATION_ERROR         │
//! │     ├── DbError::NotFound / *NotFound ──► 404 NOT_FOUND                │
//! │     ├── role check ─────────────────────► 403 FORBIDDEN                │
//! │     ├── DbError::UniqueViolation ───────► 409 CONFLICT                 │
//! │     ├── DbError::ForeignKeyViolation ───► 409 CONFLICT                 │
//! │     ├── CoreError::InsufficientStock ───► 409 INSUFFICIENT_STOCK       │
//! │     ├── ProrationError::ZeroProductCost ► 422 BUSINESS_RULE            │
//! │     ├── DbError::Timeout ───────────────► 503 TIMEOUT                  │
//! │     └── everything else ────────────────► 500 INTERNAL (logged)        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Response Body
//! ```json
//! { "error": "Product not found: 5f0c…", "code": "NOT_FOUND" }
//! ```
//! `detail` is added for validation errors that carry a field name.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mostrador_core::{CoreError, ProrationError, ValidationError};
use mostrador_db::DbError;
use serde::Serialize;

/// Error returned from every handler.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub detail: Option<String>,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Input validation failed (400)
    ValidationError,

    /// Missing role (403)
    Forbidden,

    /// Resource not found (404)
    NotFound,

    /// Uniqueness or reference conflict (409)
    Conflict,

    /// Sale line exceeds stock (409)
    InsufficientStock,

    /// Business rule rejected the request (422)
    BusinessRule,

    /// Transaction budget exceeded (503)
    Timeout,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict | ErrorCode::InsufficientStock => StatusCode::CONFLICT,
            ErrorCode::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
            code: self.code,
            detail: self.detail.as_deref(),
        };
        (self.status(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Unwraps a JSON body, turning deserialization failures into 400s.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    result
        .map(|Json(v)| v)
        .map_err(|err| ApiError::validation(err.body_text()))
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::NotANumber { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::Empty { field } => Some(field.clone()),
            ValidationError::Duplicate { field, value } => {
                return ApiError::new(
                    ErrorCode::Conflict,
                    format!("{} '{}' already exists", field, value),
                );
            }
        };

        let api = ApiError::validation(err.to_string());
        match field {
            Some(field) => api.with_detail(field),
            None => api,
        }
    }
}

impl From<ProrationError> for ApiError {
    fn from(err: ProrationError) -> Self {
        match err {
            ProrationError::EmptyOrder => ApiError::validation(err.to_string()),
            ProrationError::ZeroProductCost => ApiError::new(ErrorCode::BusinessRule, err.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ApiError::not_found("Product", &id),
            CoreError::CustomerNotFound(id) => ApiError::not_found("Customer", &id),
            CoreError::CategoryNotFound(id) => ApiError::not_found("Category", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            e @ CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            CoreError::Proration(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::debug!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::Conflict, "Resource is still referenced")
            }
            DbError::CheckViolation { message } => {
                tracing::debug!("Check violation: {}", message);
                ApiError::validation("Value violates a data constraint")
            }
            DbError::Timeout(after) => {
                tracing::warn!(?after, "Database transaction timed out");
                ApiError::new(ErrorCode::Timeout, "Operation timed out, nothing was changed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::internal("Database busy")
            }
            e @ (DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::QueryFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::Internal(_)) => {
                tracing::error!("Database error: {}", e);
                ApiError::internal("Database operation failed")
            }
        }
    }
}

//! API error type with `IntoResponse`.
//!
//! Every failure leaves a handler as an [`ApiError`] and is rendered as
//! `{"code": "...", "message": "..."}` with the matching status:
//!
//! ```text
//! ValidationError / bad input        → 400 VALIDATION_ERROR
//! malformed body, query or path      → 400 VALIDATION_ERROR
//! missing or invalid token          → 401 UNAUTHORIZED
//! role too low                       → 403 FORBIDDEN
//! DbError::NotFound                  → 404 NOT_FOUND
//! DbError::UniqueViolation           → 409 CONFLICT
//! CoreError (business rule)          → 422 <rule code>
//! email provider failure             → 502 EMAIL_PROVIDER_ERROR
//! anything else                      → 500 INTERNAL_ERROR (cause logged)
//! ```

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use storehub_core::{CoreError, ValidationError};
use storehub_db::DbError;

use crate::email::EmailError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        ApiError {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Logs the real cause and hides it from the client.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        tracing::error!("Internal error: {}", cause);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "an internal error occurred",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let code = match &e {
            CoreError::Validation(v) => return Self::bad_request(v.to_string()),
            CoreError::DrawerAlreadyOpen { .. } => {
                return Self::new(StatusCode::CONFLICT, "DRAWER_ALREADY_OPEN", e.to_string())
            }
            CoreError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            CoreError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            CoreError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CoreError::Inactive { .. } => "INACTIVE",
            CoreError::NegativeDrawerBalance { .. } => "NEGATIVE_DRAWER_BALANCE",
            CoreError::InvalidPaymentAmount { .. } => "INVALID_PAYMENT",
            CoreError::OverReceipt { .. } => "OVER_RECEIPT",
            CoreError::DrawerNotOpen { .. } => "DRAWER_NOT_OPEN",
            CoreError::TooManyLines { .. } | CoreError::SelfAction(_) => "BUSINESS_RULE",
        };
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, e.to_string())
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { .. } => Self::not_found(e.to_string()),
            DbError::UniqueViolation { .. } => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", e.to_string())
            }
            DbError::ForeignKeyViolation { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "INVALID_REFERENCE", e.to_string())
            }
            DbError::CheckViolation { .. } => Self::bad_request(e.to_string()),
            DbError::Core(core) => core.into(),
            other => Self::internal(other),
        }
    }
}

impl From<EmailError> for ApiError {
    fn from(e: EmailError) -> Self {
        match e {
            EmailError::MissingVariables(_) => Self::bad_request(e.to_string()),
            EmailError::Provider(_) | EmailError::Http(_) => {
                tracing::warn!("Email provider failure: {}", e);
                Self::new(StatusCode::BAD_GATEWAY, "EMAIL_PROVIDER_ERROR", e.to_string())
            }
            EmailError::Db(db) => db.into(),
        }
    }
}

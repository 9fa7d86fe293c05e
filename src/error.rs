use crate::model::holiday::Holiday;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Failure categories surfaced by the API. Authentication and authorization
/// are deliberately separate variants: a missing or bad credential must never
/// be reported as a role/department mismatch, and vice versa.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// Validation failure that carries the overlapping holidays so the client
    /// can show which dates blocked the request.
    #[display(fmt = "{}", message)]
    HolidayConflict {
        message: String,
        holidays: Vec<Holiday>,
    },
    #[display(fmt = "{}", _0)]
    Unauthenticated(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// Persistence or transport failure. Details are logged where the error
    /// is raised; callers only ever see the generic body.
    #[display(fmt = "internal error")]
    Internal,
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database failure");
        AppError::Internal
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::HolidayConflict { .. } => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::HolidayConflict { message, holidays } => {
                HttpResponse::build(self.status_code()).json(json!({
                    "message": message,
                    "holidays": holidays,
                }))
            }
            AppError::Internal => HttpResponse::build(self.status_code()).json(json!({
                "message": "Something went wrong, contact the system admin"
            })),
            other => HttpResponse::build(self.status_code()).json(json!({
                "message": other.to_string()
            })),
        }
    }
}

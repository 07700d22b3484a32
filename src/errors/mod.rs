use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use std::fmt;

use crate::db::StoreError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or malformed input, with the camelCase names of the offending fields.
    Validation { message: String, fields: Vec<String> },
    /// Uniqueness violation. Reported as 400 like any other rejected input.
    Conflict(String),
    NotFound(String),
    Unauthorized(String),
    /// Store unreachable or internal fault. The detail is logged, never returned.
    Infrastructure(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "no_fields")]
    fields: &'a [String],
}

fn no_fields(fields: &&[String]) -> bool {
    fields.is_empty()
}

impl AppError {
    pub fn validation(message: impl Into<String>, fields: Vec<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            fields,
        }
    }

    pub fn missing_fields(fields: &[&str]) -> Self {
        AppError::Validation {
            message: format!("Missing required fields: {}", fields.join(", ")),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Field names carried by a validation error; empty for every other kind.
    pub fn fields(&self) -> &[String] {
        match self {
            AppError::Validation { fields, .. } => fields,
            _ => &[],
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation { message, .. } => write!(f, "Validation Error: {}", message),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Infrastructure(msg) => write!(f, "Infrastructure Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (message, fields): (&str, &[String]) = match self {
            AppError::Validation { message, fields } => (message.as_str(), fields.as_slice()),
            AppError::Conflict(msg) | AppError::NotFound(msg) | AppError::Unauthorized(msg) => {
                (msg.as_str(), &[][..])
            }
            AppError::Infrastructure(_) => (INTERNAL_ERROR_MESSAGE, &[][..]),
        };
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: message,
            fields,
        })
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation => {
                AppError::Conflict("An employee with this NIC number already exists".to_string())
            }
            other => {
                error!("Store error: {}", other);
                AppError::Infrastructure(other.to_string())
            }
        }
    }
}

//! Client-facing error taxonomy.
//!
//! Every failure branch of the user handlers has its own numeric code,
//! independent of the HTTP status, so clients can tell apart causes that
//! share a status:
//!
//! | code | status | cause |
//! |------|--------|-------|
//! | 1 | 400 | create payload rejected |
//! | 2 | 400 | store failed to create |
//! | 3 | 404 | record not found |
//! | 4 | 500 | store failed to look up |
//! | 5 | 400 | update payload rejected |
//! | 6 | 400 | store failed to update |
//! | 7 | 500 | store failed to delete |
//! | 8 | 408 | request exceeded the configured timeout |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::model::ValidationError;
use crate::store::StoreError;

/// Message used for every not-found response.
pub const NOT_FOUND_MESSAGE: &str = "Not found";

pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Application-level error code.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    CreateValidation = 1,
    CreatePersistence = 2,
    NotFound = 3,
    Lookup = 4,
    UpdateValidation = 5,
    UpdatePersistence = 6,
    Delete = 7,
    Timeout = 8,
}

impl ErrorCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::CreateValidation
            | ErrorCode::CreatePersistence
            | ErrorCode::UpdateValidation
            | ErrorCode::UpdatePersistence => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Lookup | ErrorCode::Delete => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}

/// An error ready to be sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, NOT_FOUND_MESSAGE)
    }

    pub fn timeout() -> Self {
        Self::new(ErrorCode::Timeout, TIMEOUT_MESSAGE)
    }

    pub fn create_validation(err: ValidationError) -> Self {
        Self::new(ErrorCode::CreateValidation, err.to_string())
    }

    pub fn update_validation(err: ValidationError) -> Self {
        Self::new(ErrorCode::UpdateValidation, err.to_string())
    }

    pub fn create_failed(err: StoreError) -> Self {
        Self::new(ErrorCode::CreatePersistence, err.to_string())
    }

    pub fn update_failed(err: StoreError) -> Self {
        Self::new(ErrorCode::UpdatePersistence, err.to_string())
    }

    pub fn delete_failed(err: StoreError) -> Self {
        Self::new(ErrorCode::Delete, err.to_string())
    }

    /// Map a lookup failure, branching on the error kind.
    pub fn lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found(),
            other => Self::new(ErrorCode::Lookup, other.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.as_u16(),
            message: self.message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code.as_u16(), message = %self.message, "Request failed");
        } else {
            tracing::debug!(code = self.code.as_u16(), message = %self.message, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}

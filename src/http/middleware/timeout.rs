//! Coded bodies for timed-out requests.
//!
//! The timeout layer answers with a bare 408. Handlers never produce that
//! status themselves, so any 408 passing through here came from the timeout
//! and is rewritten into the usual `{code, message}` shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;

pub async fn code_timeouts(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("Request timed out");
        return ApiError::timeout().into_response();
    }
    response
}

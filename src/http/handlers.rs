//! Route handlers for the user resource.
//!
//! Each request walks `Received → Validated → Persisted → Responded`,
//! leaving early with an [`ApiError`] when validation or the store fails.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::model::{User, UserId, UserInput, ValidationError};

/// Content type of the Prometheus text exposition format.
pub const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "OK".to_string(),
    })
}

/// Prometheus scrape endpoint.
pub async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.exporter {
        Some(exporter) => (
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            exporter.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn read_input(body: Result<Bytes, BytesRejection>) -> Result<UserInput, ValidationError> {
    let body = body.map_err(|rejection| ValidationError::Unreadable(rejection.body_text()))?;
    UserInput::from_json_bytes(&body)
}

#[instrument(name = "user.create", skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let input = read_input(body).map_err(ApiError::create_validation)?;

    let user = state
        .store
        .create(input)
        .await
        .map_err(ApiError::create_failed)?;

    tracing::info!(user_id = %user.id(), "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(name = "user.get", skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let id = user_id.parse::<UserId>().map_err(|_| ApiError::not_found())?;
    let user = state.store.find_by_id(id).await.map_err(ApiError::lookup)?;
    Ok(Json(user))
}

#[instrument(name = "user.update", skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<User>, ApiError> {
    let id = user_id.parse::<UserId>().map_err(|_| ApiError::not_found())?;

    // The record must exist before the payload is even looked at.
    let existing = state.store.find_by_id(id).await.map_err(ApiError::lookup)?;

    let input = read_input(body).map_err(ApiError::update_validation)?;

    let user = state
        .store
        .update_fields(&existing, input)
        .await
        .map_err(ApiError::update_failed)?;

    tracing::info!(user_id = %id, "User updated");
    Ok(Json(user))
}

#[instrument(name = "user.delete", skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let Ok(id) = user_id.parse::<UserId>() else {
        // Nothing can live under a malformed id, so there is nothing to delete.
        return Ok(StatusCode::NO_CONTENT);
    };

    state
        .store
        .delete_by_id(id)
        .await
        .map_err(ApiError::delete_failed)?;

    tracing::info!(user_id = %id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

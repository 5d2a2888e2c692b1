//! `/history` endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::history::HistoryRecord;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::relay::{RequestDescription, ResponseEnvelope};

/// Body of `POST /history`.
#[derive(Debug, Deserialize)]
pub struct NewHistoryRecord {
    pub request: RequestDescription,
    #[serde(default)]
    pub response: Option<ResponseEnvelope>,
}

pub async fn add(
    State(state): State<AppState>,
    payload: Result<Json<NewHistoryRecord>, JsonRejection>,
) -> Result<(StatusCode, Json<HistoryRecord>), ApiError> {
    let Json(NewHistoryRecord { request, response }) = payload?;
    let record = state.history.add(request, response);
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list(State(state): State<AppState>) -> Json<Vec<HistoryRecord>> {
    Json(state.history.list())
}

/// Returns the record, or 200 with an empty body when the id is unknown.
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.history.get_by_id(&id) {
        Some(record) => Json(record).into_response(),
        None => StatusCode::OK.into_response(),
    }
}

/// Always 204, whether or not a record was removed.
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    let removed = state.history.delete_by_id(&id);
    tracing::debug!(id = %id, removed, "History delete requested");
    StatusCode::NO_CONTENT
}

pub async fn clear(State(state): State<AppState>) -> StatusCode {
    state.history.clear();
    StatusCode::NO_CONTENT
}

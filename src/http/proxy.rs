//! `POST /proxy/send`.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::relay::{RequestDescription, ResponseEnvelope};

/// Execute a request description through the relay.
///
/// Upstream error statuses, transport failures and an expired deadline all
/// come back as a 200 carrying the envelope; only invalid input is answered
/// with a 4xx.
pub async fn send(
    State(state): State<AppState>,
    payload: Result<Json<RequestDescription>, JsonRejection>,
) -> Result<Json<ResponseEnvelope>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    Ok(Json(
        state
            .relay
            .execute_within(request, state.relay_deadline)
            .await,
    ))
}

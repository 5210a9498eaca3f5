use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use ridepool_booking::{JoinSubmission, PassengerCountPatch};
use ridepool_core::models::JoinRequest;

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/offers/{id}/join-requests", post(submit).get(list_for_offer))
        .route("/v1/join-requests/{id}", get(get_join_request).patch(update_passenger_count))
        .route("/v1/join-requests/{id}/accept", post(accept))
        .route("/v1/join-requests/{id}/reject", post(reject))
        .route("/v1/join-requests/{id}/cancel", post(cancel))
}

/// POST /v1/offers/{id}/join-requests
async fn submit(
    State(state): State<AppState>,
    Caller(requester): Caller,
    Path(offer_id): Path<Uuid>,
    Json(submission): Json<JoinSubmission>,
) -> Result<(StatusCode, Json<JoinRequest>), AppError> {
    let join_request = state.join_requests.submit(&requester, offer_id, submission).await?;
    Ok((StatusCode::CREATED, Json(join_request)))
}

/// GET /v1/offers/{id}/join-requests
/// Driver only.
async fn list_for_offer(
    State(state): State<AppState>,
    Caller(driver): Caller,
    Path(offer_id): Path<Uuid>,
) -> Result<Json<Vec<JoinRequest>>, AppError> {
    Ok(Json(state.join_requests.list_for_offer(&driver.subject, offer_id).await?))
}

async fn get_join_request(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<JoinRequest>, AppError> {
    Ok(Json(state.join_requests.get(&caller.subject, id).await?))
}

/// PATCH /v1/join-requests/{id}
async fn update_passenger_count(
    State(state): State<AppState>,
    Caller(requester): Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<PassengerCountPatch>,
) -> Result<Json<JoinRequest>, AppError> {
    let updated = state
        .join_requests
        .update_passenger_count(&requester.subject, id, patch.passenger_count)
        .await?;
    Ok(Json(updated))
}

async fn accept(
    State(state): State<AppState>,
    Caller(driver): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<JoinRequest>, AppError> {
    Ok(Json(state.join_requests.accept(&driver.subject, id).await?))
}

async fn reject(
    State(state): State<AppState>,
    Caller(driver): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<JoinRequest>, AppError> {
    Ok(Json(state.join_requests.reject(&driver.subject, id).await?))
}

/// POST /v1/join-requests/{id}/cancel
/// Body is optional: `{"reason": "..."}`.
async fn cancel(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<JoinRequest>, AppError> {
    let CancelBody { reason } = if body.is_empty() {
        CancelBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::bad_request(format!("invalid cancel body: {}", e)))?
    };
    Ok(Json(state.join_requests.cancel(&caller.subject, id, reason).await?))
}

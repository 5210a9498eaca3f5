use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use ridepool_core::models::{Event, OfferView, RideRequest};
use ridepool_offer::{EventCancellation, EventDraft, EventPatch};

use crate::error::AppError;
use crate::middleware::{Caller, Viewer};
use crate::state::AppState;

/// `?access_code=` on reads of private events.
#[derive(Debug, Default, Deserialize)]
pub struct AccessQuery {
    pub access_code: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/events", post(create_event))
        .route("/v1/events/{id}", get(get_event).patch(update_event).delete(delete_event))
        .route("/v1/events/{id}/offers", get(list_offers))
        .route("/v1/events/{id}/requests", get(list_requests))
}

/// POST /v1/events
async fn create_event(
    State(state): State<AppState>,
    Caller(organizer): Caller,
    Json(draft): Json<EventDraft>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = state.events.create_event(&organizer, draft).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// GET /v1/events/{id}
async fn get_event(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<Event>, AppError> {
    let event = state
        .events
        .get_event(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(event))
}

/// PATCH /v1/events/{id}
async fn update_event(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<EventPatch>,
) -> Result<Json<Event>, AppError> {
    Ok(Json(state.events.update_event(&caller.subject, id, patch).await?))
}

/// DELETE /v1/events/{id}
/// Cancels every listing on the event along with it.
async fn delete_event(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<EventCancellation>, AppError> {
    Ok(Json(state.events.delete_event(&caller.subject, id).await?))
}

/// GET /v1/events/{id}/offers
async fn list_offers(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<Vec<OfferView>>, AppError> {
    let offers = state
        .offers
        .list_by_event(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(offers))
}

/// GET /v1/events/{id}/requests
async fn list_requests(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<Vec<RideRequest>>, AppError> {
    let requests = state
        .requests
        .list_by_event(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(requests))
}

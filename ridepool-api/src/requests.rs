use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use ridepool_core::models::{OfferView, RideRequest};
use ridepool_offer::RequestPatch;

use crate::error::AppError;
use crate::events::AccessQuery;
use crate::middleware::{Caller, Viewer};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/requests/{id}",
            get(get_request).patch(update_request).delete(delete_request),
        )
        .route("/v1/requests/{id}/matches", get(find_matches))
}

async fn get_request(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<RideRequest>, AppError> {
    let request = state
        .requests
        .get_request(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(request))
}

async fn update_request(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<RequestPatch>,
) -> Result<Json<RideRequest>, AppError> {
    Ok(Json(state.requests.update_request(&caller.subject, id, patch).await?))
}

/// Soft delete: the request is cancelled and stays readable.
async fn delete_request(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, AppError> {
    Ok(Json(state.requests.delete_request(&caller.subject, id).await?))
}

async fn find_matches(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<Vec<OfferView>>, AppError> {
    let matches = state
        .requests
        .find_matches(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(matches))
}

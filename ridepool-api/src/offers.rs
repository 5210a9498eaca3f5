use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_core::models::OfferView;
use ridepool_offer::{OfferPatch, OfferRemoval};

use crate::error::AppError;
use crate::events::AccessQuery;
use crate::middleware::{Caller, Viewer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CapQuery {
    pub distance_km: f64,
}

#[derive(Debug, Serialize)]
pub struct CapResponse {
    pub distance_km: f64,
    pub max_amount: i64,
    pub currency: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/offers/{id}", get(get_offer).patch(update_offer).delete(delete_offer))
        .route("/v1/pricing/cap", get(price_cap))
}

/// GET /v1/offers/{id}
async fn get_offer(
    State(state): State<AppState>,
    viewer: Viewer,
    Path(id): Path<Uuid>,
    Query(query): Query<AccessQuery>,
) -> Result<Json<OfferView>, AppError> {
    let offer = state
        .offers
        .get_offer(id, viewer.subject(), query.access_code.as_deref())
        .await?;
    Ok(Json(offer))
}

/// PATCH /v1/offers/{id}
async fn update_offer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
    Json(patch): Json<OfferPatch>,
) -> Result<Json<OfferView>, AppError> {
    Ok(Json(state.offers.update_offer(&caller.subject, id, patch).await?))
}

/// DELETE /v1/offers/{id}
async fn delete_offer(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<Uuid>,
) -> Result<Json<OfferRemoval>, AppError> {
    Ok(Json(state.offers.delete_offer(&caller.subject, id).await?))
}

/// GET /v1/pricing/cap?distance_km=
/// The highest fare a driver may ask for a one-way route of that length.
async fn price_cap(
    State(state): State<AppState>,
    Query(query): Query<CapQuery>,
) -> Result<Json<CapResponse>, AppError> {
    if !query.distance_km.is_finite() || query.distance_km < 0.0 {
        return Err(AppError::bad_request("distance_km must be a non-negative number"));
    }
    let pricing = state.offers.pricing();
    Ok(Json(CapResponse {
        distance_km: query.distance_km,
        max_amount: pricing.cap(query.distance_km),
        currency: pricing.config().currency.clone(),
    }))
}

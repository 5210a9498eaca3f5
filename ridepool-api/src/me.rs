use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use ridepool_core::models::{JoinRequest, OfferView, RideRequest};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

/// Everything the caller has put on the board, withdrawn listings included.
#[derive(Debug, Serialize)]
pub struct MyRides {
    pub offers: Vec<OfferView>,
    pub requests: Vec<RideRequest>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/me/rides", get(my_rides))
        .route("/v1/me/join-requests", get(my_join_requests))
}

async fn my_rides(State(state): State<AppState>, Caller(me): Caller) -> Result<Json<MyRides>, AppError> {
    let offers = state.offers.list_owned(&me.subject).await?;
    let requests = state.requests.list_owned(&me.subject).await?;
    Ok(Json(MyRides { offers, requests }))
}

async fn my_join_requests(
    State(state): State<AppState>,
    Caller(me): Caller,
) -> Result<Json<Vec<JoinRequest>>, AppError> {
    Ok(Json(state.join_requests.list_for_requester(&me.subject).await?))
}

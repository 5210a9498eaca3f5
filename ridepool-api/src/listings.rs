use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use ridepool_offer::{Listing, ListingDraft};

use crate::error::AppError;
use crate::middleware::Caller;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/listings", post(create_listing))
}

/// POST /v1/listings
/// One endpoint for both sides of the board; `kind` picks offer or request.
async fn create_listing(
    State(state): State<AppState>,
    Caller(owner): Caller,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let listing = state.board.create(&owner, draft).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

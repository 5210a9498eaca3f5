use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_core::identity::Identity;
use ridepool_core::models::Gender;

use crate::{error::AppError, middleware::auth::issue_token, state::AppState};

#[derive(Debug, Deserialize)]
pub struct GuestLogin {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    subject: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

/// Development sign-in: whatever profile is posted becomes a fresh guest identity.
async fn login_guest(
    State(state): State<AppState>,
    Json(login): Json<GuestLogin>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = login.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("name is required"));
    }

    let identity = Identity {
        subject: format!("guest-{}", Uuid::new_v4()),
        name: name.to_string(),
        phone: login.phone,
        email: login.email,
        gender: login.gender,
    };
    let token = issue_token(&identity, "GUEST", &state.auth.secret, state.auth.expiration)?;
    tracing::info!("Issued guest token for {}", identity.subject);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            subject: identity.subject,
        }),
    ))
}

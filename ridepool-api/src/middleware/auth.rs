use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use ridepool_core::identity::{Identity, IdentityProvider};
use ridepool_core::models::Gender;
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::Masked;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<Masked<String>>,
    #[serde(default)]
    pub phone: Option<Masked<String>>,
    #[serde(default)]
    pub gender: Option<Gender>,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    pub fn for_identity(identity: &Identity, role: &str, ttl_seconds: u64) -> Self {
        Self {
            sub: identity.subject.clone(),
            name: identity.name.clone(),
            email: identity.email.clone().map(Masked::new),
            phone: identity.phone.clone().map(Masked::new),
            gender: identity.gender,
            role: role.to_owned(),
            exp: (Utc::now() + Duration::seconds(ttl_seconds as i64)).timestamp() as usize,
        }
    }

    pub fn into_identity(self) -> Identity {
        Identity {
            subject: self.sub,
            name: self.name,
            phone: self.phone.map(Masked::into_inner),
            email: self.email.map(Masked::into_inner),
            gender: self.gender,
        }
    }
}

pub fn issue_token(identity: &Identity, role: &str, secret: &str, ttl_seconds: u64) -> CoreResult<String> {
    let claims = Claims::for_identity(identity, role, ttl_seconds);
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| CoreError::Storage(format!("Token encoding failed: {}", e)))
}

/// HS256 bearer tokens signed with the configured secret.
pub struct JwtIdentityProvider {
    decoding: DecodingKey,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn verify(&self, credential: &str) -> CoreResult<Identity> {
        let token_data = decode::<Claims>(credential, &self.decoding, &Validation::default()).map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            CoreError::Unauthenticated("invalid or expired token".to_string())
        })?;
        Ok(token_data.claims.into_identity())
    }
}

// ============================================================================
// Authentication Middleware
// ============================================================================

/// Resolves the bearer token, if any, into an [`Identity`] request extension.
/// Anonymous requests pass through; a token that does not verify is refused.
pub async fn authenticate(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, AppError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthenticated("expected a bearer token"))?;

    let identity = state.identity.verify(token).await?;
    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

// ============================================================================
// Extractors
// ============================================================================

/// The authenticated caller. Rejects anonymous requests with 401.
pub struct Caller(pub Identity);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| AppError::unauthenticated("a bearer token is required"))
    }
}

/// Whoever is looking, if they said. Used on read endpoints where redaction depends on it.
pub struct Viewer(pub Option<Identity>);

impl Viewer {
    pub fn subject(&self) -> Option<&str> {
        self.0.as_ref().map(|identity| identity.subject.as_str())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Viewer {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Viewer(parts.extensions.get::<Identity>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anna() -> Identity {
        Identity {
            subject: "user-anna".to_string(),
            name: "Anna".to_string(),
            phone: Some("+48 600 100 200".to_string()),
            email: None,
            gender: Some(Gender::Female),
        }
    }

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let token = issue_token(&anna(), "GUEST", "secret", 60).unwrap();
        let identity = JwtIdentityProvider::new("secret").verify(&token).await.unwrap();
        assert_eq!(identity, anna());
    }

    #[tokio::test]
    async fn test_wrong_secret_is_unauthenticated() {
        let token = issue_token(&anna(), "GUEST", "secret", 60).unwrap();
        assert!(matches!(
            JwtIdentityProvider::new("other").verify(&token).await,
            Err(CoreError::Unauthenticated(_))
        ));
    }

    #[test]
    fn test_claims_debug_masks_contact() {
        let claims = Claims::for_identity(&anna(), "GUEST", 60);
        assert!(!format!("{:?}", claims).contains("600 100 200"));
    }
}

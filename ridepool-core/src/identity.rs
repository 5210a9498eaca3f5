use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use async_trait::async_trait;

use crate::models::listing::Gender;
use crate::{CoreError, CoreResult};

/// Verified contact details of the caller, as supplied by the identity adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub subject: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<Gender>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify a credential (bearer token, session id) and return who it belongs to
    async fn verify(&self, credential: &str) -> CoreResult<Identity>;
}

/// Fixed credential table. Used by tests and local development.
#[derive(Default)]
pub struct StaticIdentityProvider {
    identities: HashMap<String, Identity>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, credential: &str, identity: Identity) -> Self {
        self.identities.insert(credential.to_string(), identity);
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn verify(&self, credential: &str) -> CoreResult<Identity> {
        tracing::debug!("Resolving static identity credential");
        self.identities
            .get(credential)
            .cloned()
            .ok_or_else(|| CoreError::Unauthenticated("unknown credential".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider() {
        let provider = StaticIdentityProvider::new().with(
            "token-a",
            Identity {
                subject: "user-a".to_string(),
                name: "Anna".to_string(),
                phone: None,
                email: Some("anna@example.com".to_string()),
                gender: Some(Gender::Female),
            },
        );

        assert_eq!(provider.verify("token-a").await.unwrap().subject, "user-a");
        assert!(matches!(
            provider.verify("token-b").await,
            Err(CoreError::Unauthenticated(_))
        ));
    }
}

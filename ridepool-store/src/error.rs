use ridepool_core::CoreError;

/// Failures of the infrastructure adapters, before they cross into the core.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Corrupt(String),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Storage failure: {}", err);
        CoreError::Storage(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

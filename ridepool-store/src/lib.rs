pub mod app_config;
pub mod database;
pub mod error;
pub mod events;
pub mod memory;
pub mod pg_ledger;
pub mod pg_repo;
pub mod redis_repo;
pub mod routing_client;

pub use app_config::Config;
pub use database::DbClient;
pub use error::StoreError;
pub use events::BroadcastEventSink;
pub use memory::InMemoryStore;
pub use pg_ledger::PgSeatLedger;
pub use pg_repo::PgStore;
pub use redis_repo::{RedisClient, RedisSeatLedger};
pub use routing_client::{OsrmRouter, RoutingClientError};

use serde::Deserialize;
use std::env;

use ridepool_catalog::PricingConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    pub routing: RoutingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProvider {
    Osrm,
    StraightLine,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    pub provider: RoutingProvider,
    pub osrm_url: String,
    pub nominatim_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_average_speed")]
    pub average_speed_kmh: f64,
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_average_speed() -> f64 {
    40.0
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    #[default]
    Memory,
    Redis,
    Postgres,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: RepositoryBackend,
    #[serde(default)]
    pub seat_ledger: LedgerBackend,
}

impl StorageConfig {
    /// Durable offers need a durable ledger: an in-memory one starts empty after a restart
    /// and would no longer know any stored offer's seats.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.backend == RepositoryBackend::Postgres && self.seat_ledger == LedgerBackend::Memory {
            return Err(config::ConfigError::Message(
                "storage.backend = \"postgres\" needs storage.seat_ledger = \"redis\" or \"postgres\"".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `RIDEPOOL__PRICING__PRICE_PER_KM=45`
            .add_source(config::Environment::with_prefix("RIDEPOOL").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.storage.validate()?;
        Ok(config)
    }
}

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ridepool_api::{
    app,
    middleware::JwtIdentityProvider,
    state::{AppState, AuthConfig},
};
use ridepool_catalog::{InMemorySeatLedger, PickupProjector, PriceCapCalculator, SeatLedger};
use ridepool_core::routing::{BoundedRouter, GeoRouter, StraightLineRouter};
use ridepool_offer::Storage;
use ridepool_store::app_config::{Config, LedgerBackend, RepositoryBackend, RoutingProvider};
use ridepool_store::events::log_events;
use ridepool_store::{
    BroadcastEventSink, DbClient, InMemoryStore, OsrmRouter, PgSeatLedger, PgStore, RedisClient, RedisSeatLedger,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridepool_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Ridepool API on port {}", config.server.port);

    // Domain events: logged for now, any other consumer subscribes to the same bus
    let bus = Arc::new(BroadcastEventSink::new(1024));
    tokio::spawn(log_events(bus.subscribe()));

    let needs_db = config.storage.backend == RepositoryBackend::Postgres
        || config.storage.seat_ledger == LedgerBackend::Postgres;
    let db = if needs_db {
        let db_config = config
            .database
            .as_ref()
            .context("[database] is required by the postgres storage backend")?;
        let db = DbClient::new(db_config).await.context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        Some(db)
    } else {
        None
    };

    let ledger = seat_ledger(&config, db.as_ref()).await?;
    let storage = match &db {
        Some(db) if config.storage.backend == RepositoryBackend::Postgres => {
            let repos = Arc::new(PgStore::new(db.pool.clone()));
            tracing::info!("Repositories: postgres");
            Storage {
                events: repos.clone(),
                offers: repos.clone(),
                requests: repos.clone(),
                join_requests: repos,
                ledger,
                sink: bus.clone(),
            }
        }
        _ => {
            let repos = Arc::new(InMemoryStore::new());
            tracing::warn!("Repositories: in-memory, nothing survives a restart");
            Storage {
                events: repos.clone(),
                offers: repos.clone(),
                requests: repos.clone(),
                join_requests: repos,
                ledger,
                sink: bus.clone(),
            }
        }
    };

    let geo: Arc<dyn GeoRouter> = match config.routing.provider {
        RoutingProvider::Osrm => {
            tracing::info!("Routing via OSRM at {}", config.routing.osrm_url);
            Arc::new(OsrmRouter::from_config(&config.routing).context("Failed to build routing client")?)
        }
        RoutingProvider::StraightLine => {
            tracing::warn!("Routing with straight lines; distances are approximate");
            Arc::new(StraightLineRouter::new(config.routing.average_speed_kmh))
        }
    };
    let router = BoundedRouter::new(geo, Duration::from_millis(config.routing.timeout_ms));

    let app_state = AppState::new(
        storage,
        router,
        PriceCapCalculator::new(config.pricing.clone()),
        PickupProjector::new(config.routing.average_speed_kmh),
        Arc::new(JwtIdentityProvider::new(&config.auth.jwt_secret)),
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    );

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn seat_ledger(config: &Config, db: Option<&DbClient>) -> anyhow::Result<Arc<dyn SeatLedger>> {
    let ledger: Arc<dyn SeatLedger> = match config.storage.seat_ledger {
        LedgerBackend::Memory => Arc::new(InMemorySeatLedger::new()),
        LedgerBackend::Redis => {
            let redis_config = config
                .redis
                .as_ref()
                .context("[redis] is required by the redis seat ledger")?;
            let redis = RedisClient::new(&redis_config.url)
                .await
                .context("Failed to connect to Redis")?;
            redis.ping().await.context("Redis did not answer PING")?;
            Arc::new(RedisSeatLedger::new(redis))
        }
        LedgerBackend::Postgres => {
            let db = db.context("[database] is required by the postgres seat ledger")?;
            Arc::new(PgSeatLedger::new(db.pool.clone()))
        }
    };
    tracing::info!("Seat ledger: {:?}", config.storage.seat_ledger);
    Ok(ledger)
}

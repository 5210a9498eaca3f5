use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::RedisResult;
use tracing::{info, warn};
use uuid::Uuid;

use ridepool_catalog::inventory::{ledger_miss, SeatLedger, SeatSnapshot};
use ridepool_core::CoreResult;

use crate::error::StoreError;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn connection(&self) -> RedisResult<MultiplexedConnection> {
        self.client.get_multiplexed_async_connection().await
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// Scripts return -1 when the offer has no ledger entry.
const REGISTER: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 0 then
        redis.call("HSET", KEYS[1], "total", ARGV[1], "confirmed", 0)
        return 1
    end
    return 0
"#;

const RESERVE: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 0 then
        return -1
    end
    local total = tonumber(redis.call("HGET", KEYS[1], "total"))
    local confirmed = tonumber(redis.call("HGET", KEYS[1], "confirmed"))
    local count = tonumber(ARGV[1])
    if confirmed + count > total then
        return 0
    end
    redis.call("HINCRBY", KEYS[1], "confirmed", count)
    return 1
"#;

const RELEASE: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 0 then
        return -1
    end
    local confirmed = tonumber(redis.call("HGET", KEYS[1], "confirmed"))
    local remaining = confirmed - tonumber(ARGV[1])
    if remaining < 0 then
        remaining = 0
    end
    redis.call("HSET", KEYS[1], "confirmed", remaining)
    return confirmed
"#;

const RESIZE: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 0 then
        return -1
    end
    local confirmed = tonumber(redis.call("HGET", KEYS[1], "confirmed"))
    if confirmed > tonumber(ARGV[1]) then
        return 0
    end
    redis.call("HSET", KEYS[1], "total", ARGV[1])
    return 1
"#;

/// Seat ledger kept in one Redis hash per offer (`total`, `confirmed`).
/// Each check-and-change runs as a Lua script, which Redis executes atomically.
#[derive(Clone)]
pub struct RedisSeatLedger {
    redis: RedisClient,
    register: redis::Script,
    reserve: redis::Script,
    release: redis::Script,
    resize: redis::Script,
}

impl RedisSeatLedger {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis,
            register: redis::Script::new(REGISTER),
            reserve: redis::Script::new(RESERVE),
            release: redis::Script::new(RELEASE),
            resize: redis::Script::new(RESIZE),
        }
    }

    fn key(offer_id: Uuid) -> String {
        format!("ridepool:seats:{}", offer_id)
    }

    async fn run(&self, script: &redis::Script, offer_id: Uuid, arg: u32) -> Result<i64, StoreError> {
        let mut conn = self.redis.connection().await?;
        let outcome: i64 = script
            .key(Self::key(offer_id))
            .arg(arg)
            .invoke_async(&mut conn)
            .await?;
        Ok(outcome)
    }
}

#[async_trait]
impl SeatLedger for RedisSeatLedger {
    async fn register(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<()> {
        if self.run(&self.register, offer_id, total_seats).await? == 1 {
            info!("Seat ledger opened for offer {} with {} seats", offer_id, total_seats);
        }
        Ok(())
    }

    async fn try_reserve(&self, offer_id: Uuid, count: u32) -> CoreResult<bool> {
        match self.run(&self.reserve, offer_id, count).await? {
            -1 => Err(ledger_miss(offer_id)),
            outcome => Ok(outcome == 1),
        }
    }

    async fn release(&self, offer_id: Uuid, count: u32) -> CoreResult<()> {
        match self.run(&self.release, offer_id, count).await? {
            -1 => Err(ledger_miss(offer_id)),
            previous if previous < count as i64 => {
                warn!(
                    "Released {} seats on offer {} but only {} were confirmed",
                    count, offer_id, previous
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn resize(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<bool> {
        match self.run(&self.resize, offer_id, total_seats).await? {
            -1 => Err(ledger_miss(offer_id)),
            outcome => Ok(outcome == 1),
        }
    }

    async fn snapshot(&self, offer_id: Uuid) -> CoreResult<SeatSnapshot> {
        let mut conn = self.redis.connection().await.map_err(StoreError::from)?;
        let (total, confirmed): (Option<u32>, Option<u32>) = redis::cmd("HMGET")
            .arg(Self::key(offer_id))
            .arg("total")
            .arg("confirmed")
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;

        match (total, confirmed) {
            (Some(total), Some(confirmed)) => Ok(SeatSnapshot { total, confirmed }),
            _ => Err(ledger_miss(offer_id)),
        }
    }

    async fn forget(&self, offer_id: Uuid) -> CoreResult<()> {
        let mut conn = self.redis.connection().await.map_err(StoreError::from)?;
        let _: i64 = redis::cmd("DEL")
            .arg(Self::key(offer_id))
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }
}

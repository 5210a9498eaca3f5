use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use ridepool_catalog::inventory::{ledger_miss, SeatLedger, SeatSnapshot};
use ridepool_core::CoreResult;

use crate::error::StoreError;

/// Seat ledger backed by the `seat_ledger` table. Every change is a single conditional
/// UPDATE, so the row lock taken by Postgres serializes concurrent reservations.
#[derive(Clone)]
pub struct PgSeatLedger {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    total_seats: i32,
    confirmed_seats: i32,
}

impl From<SeatRow> for SeatSnapshot {
    fn from(row: SeatRow) -> Self {
        SeatSnapshot {
            total: row.total_seats.max(0) as u32,
            confirmed: row.confirmed_seats.max(0) as u32,
        }
    }
}

impl PgSeatLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, offer_id: Uuid) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, i32>("SELECT 1 FROM seat_ledger WHERE offer_id = $1")
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl SeatLedger for PgSeatLedger {
    async fn register(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO seat_ledger (offer_id, total_seats, confirmed_seats)
            VALUES ($1, $2, 0)
            ON CONFLICT (offer_id) DO NOTHING
            "#,
        )
        .bind(offer_id)
        .bind(total_seats as i32)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn try_reserve(&self, offer_id: Uuid, count: u32) -> CoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE seat_ledger
            SET confirmed_seats = confirmed_seats + $2
            WHERE offer_id = $1 AND confirmed_seats + $2 <= total_seats
            "#,
        )
        .bind(offer_id)
        .bind(count as i32)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if !self.exists(offer_id).await? {
            return Err(ledger_miss(offer_id));
        }
        Ok(false)
    }

    async fn release(&self, offer_id: Uuid, count: u32) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE seat_ledger
            SET confirmed_seats = GREATEST(confirmed_seats - $2, 0)
            WHERE offer_id = $1
            "#,
        )
        .bind(offer_id)
        .bind(count as i32)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        if result.rows_affected() == 0 {
            return Err(ledger_miss(offer_id));
        }
        Ok(())
    }

    async fn resize(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<bool> {
        let result = sqlx::query(
            "UPDATE seat_ledger SET total_seats = $2 WHERE offer_id = $1 AND confirmed_seats <= $2",
        )
        .bind(offer_id)
        .bind(total_seats as i32)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if !self.exists(offer_id).await? {
            return Err(ledger_miss(offer_id));
        }
        Ok(false)
    }

    async fn snapshot(&self, offer_id: Uuid) -> CoreResult<SeatSnapshot> {
        let row = sqlx::query_as::<_, SeatRow>(
            "SELECT total_seats, confirmed_seats FROM seat_ledger WHERE offer_id = $1",
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        row.map(SeatSnapshot::from).ok_or_else(|| ledger_miss(offer_id))
    }

    async fn forget(&self, offer_id: Uuid) -> CoreResult<()> {
        sqlx::query("DELETE FROM seat_ledger WHERE offer_id = $1")
            .bind(offer_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(())
    }
}

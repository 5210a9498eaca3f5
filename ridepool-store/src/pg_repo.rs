use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use ridepool_core::models::{Event, JoinRequest, JoinStatus, Offer, RideRequest};
use ridepool_core::repository::{
    EventRepository, JoinRequestRepository, OfferRepository, RequestRepository,
};
use ridepool_core::{CoreError, CoreResult};

use crate::error::StoreError;

/// Postgres repositories. Each record lives whole in a JSONB `body`; the plain columns
/// beside it are kept in sync for filtering and for the join request constraints.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_of<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::Corrupt(format!("unexpected status encoding: {}", other))),
    }
}

fn missing(kind: &str, id: Uuid, rows_affected: u64) -> CoreResult<()> {
    if rows_affected == 0 {
        Err(CoreError::not_found(kind, id))
    } else {
        Ok(())
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn insert_event(&self, event: &Event) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, organizer_id, status, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(&event.organizer_id)
        .bind(status_of(&event.status)?)
        .bind(Json(event))
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_event(&self, id: Uuid) -> CoreResult<Option<Event>> {
        let row = sqlx::query_scalar::<_, Json<Event>>("SELECT body FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(row.map(|Json(event)| event))
    }

    async fn update_event(&self, event: &Event) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE events SET status = $2, body = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(event.id)
        .bind(status_of(&event.status)?)
        .bind(Json(event))
        .bind(event.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        missing("event", event.id, result.rows_affected())
    }
}

#[async_trait]
impl OfferRepository for PgStore {
    async fn insert_offer(&self, offer: &Offer) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO offers (id, event_id, owner_id, status, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(offer.id)
        .bind(offer.event_id)
        .bind(&offer.owner_id)
        .bind(offer.status.to_string())
        .bind(Json(offer))
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_offer(&self, id: Uuid) -> CoreResult<Option<Offer>> {
        let row = sqlx::query_scalar::<_, Json<Offer>>("SELECT body FROM offers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(row.map(|Json(offer)| offer))
    }

    async fn update_offer(&self, offer: &Offer) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE offers SET status = $2, body = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(offer.id)
        .bind(offer.status.to_string())
        .bind(Json(offer))
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        missing("offer", offer.id, result.rows_affected())
    }

    async fn remove_offer(&self, id: Uuid) -> CoreResult<()> {
        let result = sqlx::query("DELETE FROM offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::from)?;
        missing("offer", id, result.rows_affected())
    }

    async fn list_offers_by_event(&self, event_id: Uuid) -> CoreResult<Vec<Offer>> {
        let rows = sqlx::query_scalar::<_, Json<Offer>>(
            "SELECT body FROM offers WHERE event_id = $1 ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(offer)| offer).collect())
    }

    async fn list_offers_by_owner(&self, owner_id: &str) -> CoreResult<Vec<Offer>> {
        let rows = sqlx::query_scalar::<_, Json<Offer>>(
            "SELECT body FROM offers WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(offer)| offer).collect())
    }
}

#[async_trait]
impl RequestRepository for PgStore {
    async fn insert_request(&self, request: &RideRequest) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ride_requests (id, event_id, owner_id, status, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id)
        .bind(request.event_id)
        .bind(&request.owner_id)
        .bind(status_of(&request.status)?)
        .bind(Json(request))
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> CoreResult<Option<RideRequest>> {
        let row = sqlx::query_scalar::<_, Json<RideRequest>>("SELECT body FROM ride_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(row.map(|Json(request)| request))
    }

    async fn update_request(&self, request: &RideRequest) -> CoreResult<()> {
        let result = sqlx::query(
            "UPDATE ride_requests SET status = $2, body = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(request.id)
        .bind(status_of(&request.status)?)
        .bind(Json(request))
        .bind(request.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from)?;
        missing("request", request.id, result.rows_affected())
    }

    async fn list_requests_by_event(&self, event_id: Uuid) -> CoreResult<Vec<RideRequest>> {
        let rows = sqlx::query_scalar::<_, Json<RideRequest>>(
            "SELECT body FROM ride_requests WHERE event_id = $1 ORDER BY created_at",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(request)| request).collect())
    }

    async fn list_requests_by_owner(&self, owner_id: &str) -> CoreResult<Vec<RideRequest>> {
        let rows = sqlx::query_scalar::<_, Json<RideRequest>>(
            "SELECT body FROM ride_requests WHERE owner_id = $1 ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(request)| request).collect())
    }
}

#[async_trait]
impl JoinRequestRepository for PgStore {
    async fn insert_join_request(&self, join_request: &JoinRequest) -> CoreResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO join_requests
                (id, offer_id, event_id, requester_id, status, passenger_count, cancel_reason, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(join_request.id)
        .bind(join_request.offer_id)
        .bind(join_request.event_id)
        .bind(&join_request.requester_id)
        .bind(join_request.status.as_str())
        .bind(join_request.passenger_count as i32)
        .bind(join_request.cancel_reason.as_deref())
        .bind(Json(join_request))
        .bind(join_request.created_at)
        .bind(join_request.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(CoreError::DuplicateJoinRequest {
                offer_id: join_request.offer_id,
                requester: join_request.requester_id.clone(),
            }),
            Err(e) => Err(StoreError::from(e).into()),
        }
    }

    async fn get_join_request(&self, id: Uuid) -> CoreResult<Option<JoinRequest>> {
        let row = sqlx::query_scalar::<_, Json<JoinRequest>>("SELECT body FROM join_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;
        Ok(row.map(|Json(jr)| jr))
    }

    async fn list_join_requests_by_offer(&self, offer_id: Uuid) -> CoreResult<Vec<JoinRequest>> {
        let rows = sqlx::query_scalar::<_, Json<JoinRequest>>(
            "SELECT body FROM join_requests WHERE offer_id = $1 ORDER BY created_at",
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(jr)| jr).collect())
    }

    async fn list_join_requests_by_requester(&self, requester_id: &str) -> CoreResult<Vec<JoinRequest>> {
        let rows = sqlx::query_scalar::<_, Json<JoinRequest>>(
            "SELECT body FROM join_requests WHERE requester_id = $1 ORDER BY created_at",
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        Ok(rows.into_iter().map(|Json(jr)| jr).collect())
    }

    /// Row-locked read, check, write inside one transaction.
    async fn transition(
        &self,
        id: Uuid,
        from: JoinStatus,
        to: JoinStatus,
        reason: Option<String>,
    ) -> CoreResult<Option<JoinRequest>> {
        if !from.can_transition_to(to) {
            return Err(CoreError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let row = sqlx::query_scalar::<_, Json<JoinRequest>>(
            "SELECT body FROM join_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let Some(Json(mut join_request)) = row else {
            return Err(CoreError::not_found("join request", id));
        };
        if join_request.status != from {
            return Ok(None);
        }

        join_request.update_status(to, reason);
        sqlx::query(
            r#"
            UPDATE join_requests
            SET status = $2, cancel_reason = $3, body = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(join_request.cancel_reason.as_deref())
        .bind(Json(&join_request))
        .bind(join_request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(Some(join_request))
    }

    async fn set_passenger_count(&self, id: Uuid, passenger_count: u32) -> CoreResult<Option<JoinRequest>> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let row = sqlx::query_scalar::<_, Json<JoinRequest>>(
            "SELECT body FROM join_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        let Some(Json(mut join_request)) = row else {
            return Err(CoreError::not_found("join request", id));
        };
        if join_request.status != JoinStatus::Pending {
            return Ok(None);
        }

        join_request.passenger_count = passenger_count;
        join_request.updated_at = chrono::Utc::now();
        sqlx::query(
            "UPDATE join_requests SET passenger_count = $2, body = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(passenger_count as i32)
        .bind(Json(&join_request))
        .bind(join_request.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from)?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(Some(join_request))
    }
}

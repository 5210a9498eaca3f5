use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ridepool_core::{CoreError, CoreResult};

/// Seat counts of one offer at a point in time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatSnapshot {
    pub total: u32,
    pub confirmed: u32,
}

impl SeatSnapshot {
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.confirmed)
    }
}

/// Per-offer seat accounting.
///
/// Every method is atomic with respect to other calls on the same offer, so two
/// accepts racing for the last seat cannot both win. Implementations guarantee
/// `0 ≤ confirmed ≤ total` at all times.
#[async_trait]
pub trait SeatLedger: Send + Sync {
    /// Start tracking an offer. Registering an already tracked offer keeps its counts.
    async fn register(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<()>;

    /// Hold `count` seats if they are available. `false` means nothing changed.
    async fn try_reserve(&self, offer_id: Uuid, count: u32) -> CoreResult<bool>;

    /// Give back seats previously held by `try_reserve`.
    async fn release(&self, offer_id: Uuid, count: u32) -> CoreResult<()>;

    /// Change the seat total. Refused (`false`) if it would drop below the confirmed count.
    async fn resize(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<bool>;

    async fn snapshot(&self, offer_id: Uuid) -> CoreResult<SeatSnapshot>;

    async fn forget(&self, offer_id: Uuid) -> CoreResult<()>;
}

pub fn ledger_miss(offer_id: Uuid) -> CoreError {
    CoreError::NotFound(format!("seat ledger entry for offer {}", offer_id))
}

/// Total and confirmed packed into one word so a single compare-and-swap covers both.
struct SeatCounter(AtomicU64);

impl SeatCounter {
    fn new(total: u32) -> Self {
        Self(AtomicU64::new(pack(total, 0)))
    }

    fn load(&self) -> SeatSnapshot {
        unpack(self.0.load(Ordering::Acquire))
    }

    fn update<F>(&self, f: F) -> Option<SeatSnapshot>
    where
        F: Fn(SeatSnapshot) -> Option<SeatSnapshot>,
    {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |word| {
                f(unpack(word)).map(|s| pack(s.total, s.confirmed))
            })
            .ok()
            .map(unpack)
    }
}

fn pack(total: u32, confirmed: u32) -> u64 {
    ((total as u64) << 32) | confirmed as u64
}

fn unpack(word: u64) -> SeatSnapshot {
    SeatSnapshot {
        total: (word >> 32) as u32,
        confirmed: (word & 0xFFFF_FFFF) as u32,
    }
}

/// In-process seat ledger: a lock-free compare-and-swap per offer.
#[derive(Default)]
pub struct InMemorySeatLedger {
    counters: RwLock<HashMap<Uuid, Arc<SeatCounter>>>,
}

impl InMemorySeatLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, offer_id: Uuid) -> CoreResult<Arc<SeatCounter>> {
        let counters = self
            .counters
            .read()
            .map_err(|_| CoreError::Storage("seat ledger lock poisoned".to_string()))?;
        counters.get(&offer_id).cloned().ok_or_else(|| ledger_miss(offer_id))
    }
}

#[async_trait]
impl SeatLedger for InMemorySeatLedger {
    async fn register(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|_| CoreError::Storage("seat ledger lock poisoned".to_string()))?;
        counters
            .entry(offer_id)
            .or_insert_with(|| Arc::new(SeatCounter::new(total_seats)));
        Ok(())
    }

    async fn try_reserve(&self, offer_id: Uuid, count: u32) -> CoreResult<bool> {
        let counter = self.counter(offer_id)?;
        let reserved = counter.update(|s| {
            let confirmed = s.confirmed.checked_add(count)?;
            (confirmed <= s.total).then_some(SeatSnapshot {
                total: s.total,
                confirmed,
            })
        });
        Ok(reserved.is_some())
    }

    async fn release(&self, offer_id: Uuid, count: u32) -> CoreResult<()> {
        let counter = self.counter(offer_id)?;
        let previous = counter.update(|s| {
            Some(SeatSnapshot {
                total: s.total,
                confirmed: s.confirmed.saturating_sub(count),
            })
        });
        if let Some(previous) = previous {
            if previous.confirmed < count {
                tracing::warn!(
                    "Released {} seats on offer {} but only {} were confirmed",
                    count,
                    offer_id,
                    previous.confirmed
                );
            }
        }
        Ok(())
    }

    async fn resize(&self, offer_id: Uuid, total_seats: u32) -> CoreResult<bool> {
        let counter = self.counter(offer_id)?;
        let resized = counter.update(|s| {
            (s.confirmed <= total_seats).then_some(SeatSnapshot {
                total: total_seats,
                confirmed: s.confirmed,
            })
        });
        Ok(resized.is_some())
    }

    async fn snapshot(&self, offer_id: Uuid) -> CoreResult<SeatSnapshot> {
        Ok(self.counter(offer_id)?.load())
    }

    async fn forget(&self, offer_id: Uuid) -> CoreResult<()> {
        let mut counters = self
            .counters
            .write()
            .map_err(|_| CoreError::Storage("seat ledger lock poisoned".to_string()))?;
        counters.remove(&offer_id);
        Ok(())
    }
}

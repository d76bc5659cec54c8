//! In-memory LedgerStore.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::Sequence;
use crate::interfaces::{LedgerStore, Result};
use crate::model::{EarnEvent, LedgerEntry, RedeemEvent, TimeWindow};

/// Append-only per-customer event log.
pub struct InMemoryLedgerStore {
    entries: RwLock<HashMap<String, Vec<LedgerEntry>>>,
    earn_seq: Sequence,
    redeem_seq: Sequence,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            earn_seq: Sequence::starting_at(1),
            redeem_seq: Sequence::starting_at(1),
        }
    }

    /// Total number of stored events across all customers.
    pub async fn event_count(&self) -> usize {
        self.entries.read().await.values().map(Vec::len).sum()
    }

    async fn append(&self, customer_id: &str, entry: LedgerEntry) {
        self.entries
            .write()
            .await
            .entry(customer_id.to_string())
            .or_default()
            .push(entry);
    }

    async fn fold<F>(&self, customer_id: &str, f: F) -> i64
    where
        F: Fn(&LedgerEntry) -> i64,
    {
        self.entries
            .read()
            .await
            .get(customer_id)
            .map(|entries| entries.iter().map(&f).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn record_earn(
        &self,
        customer_id: &str,
        amount_minor: i64,
        credited_points: i64,
        created_at: DateTime<Utc>,
    ) -> Result<EarnEvent> {
        let event = EarnEvent {
            id: format!("tx_{:03}", self.earn_seq.next()),
            customer_id: customer_id.to_string(),
            amount_minor,
            points: credited_points,
            created_at,
        };
        self.append(customer_id, LedgerEntry::Earn(event.clone()))
            .await;
        Ok(event)
    }

    async fn record_redeem(
        &self,
        customer_id: &str,
        points: i64,
        created_at: DateTime<Utc>,
    ) -> Result<RedeemEvent> {
        let event = RedeemEvent {
            id: format!("red_{:03}", self.redeem_seq.next()),
            customer_id: customer_id.to_string(),
            points,
            created_at,
        };
        self.append(customer_id, LedgerEntry::Redeem(event.clone()))
            .await;
        Ok(event)
    }

    async fn earned_points(&self, customer_id: &str, window: Option<TimeWindow>) -> Result<i64> {
        Ok(self
            .fold(customer_id, |entry| match entry {
                LedgerEntry::Earn(e) if window.map_or(true, |w| w.contains(e.created_at)) => {
                    e.points
                }
                _ => 0,
            })
            .await)
    }

    async fn redeemed_points(&self, customer_id: &str) -> Result<i64> {
        Ok(self
            .fold(customer_id, |entry| match entry {
                LedgerEntry::Redeem(r) => r.points,
                LedgerEntry::Earn(_) => 0,
            })
            .await)
    }

    async fn entries(&self, customer_id: &str) -> Result<Vec<LedgerEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .get(customer_id)
            .cloned()
            .unwrap_or_default())
    }
}

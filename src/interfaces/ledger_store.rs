//! Ledger storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;
use crate::model::{EarnEvent, LedgerEntry, RedeemEvent, TimeWindow};

/// Append-only store of earn and redeem events.
///
/// Implementations assign identifiers from a store-owned monotonic sequence.
/// `created_at` is supplied by the caller, which judged the daily window at
/// that same instant. Events are never updated or deleted. Aggregates are folds over the stored events.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Append an earn event with already-clamped `credited_points`.
    async fn record_earn(
        &self,
        customer_id: &str,
        amount_minor: i64,
        credited_points: i64,
        created_at: DateTime<Utc>,
    ) -> Result<EarnEvent>;

    /// Append a redeem event. `points` is validated by the caller.
    async fn record_redeem(
        &self,
        customer_id: &str,
        points: i64,
        created_at: DateTime<Utc>,
    ) -> Result<RedeemEvent>;

    /// Sum of credited points, optionally restricted to events created inside `window`.
    async fn earned_points(&self, customer_id: &str, window: Option<TimeWindow>) -> Result<i64>;

    /// Sum of redeemed points over all time.
    async fn redeemed_points(&self, customer_id: &str) -> Result<i64>;

    /// Full history for a customer in append order.
    async fn entries(&self, customer_id: &str) -> Result<Vec<LedgerEntry>>;
}

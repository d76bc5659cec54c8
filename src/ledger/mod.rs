//! Ledger queries over the append-only event store.
//!
//! Balances and time-windowed aggregates are derived by folding over stored
//! events each time they are asked for. Nothing here mutates state.

pub mod window;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::error;

use crate::clock::Clock;
use crate::error::{errmsg, LoyaltyError, Result};
use crate::interfaces::LedgerStore;
use crate::model::LedgerEntry;

pub use window::DailyWindow;

/// Point-in-time aggregates for one customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    pub balance_points: i64,
    pub today_earned_points: i64,
    pub lifetime_earned_points: i64,
    pub lifetime_redeemed_points: i64,
}

/// Read side of the ledger: store + daily window + clock.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn LedgerStore>,
    window: DailyWindow,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    pub fn new(store: Arc<dyn LedgerStore>, window: DailyWindow, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            window,
            clock,
        }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    /// Current instant from the ledger's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Lifetime earned minus lifetime redeemed.
    ///
    /// A negative result means the ledger invariant is broken; it is logged
    /// and surfaced as an internal error instead of being returned.
    pub async fn balance(&self, customer_id: &str) -> Result<i64> {
        let earned = self.lifetime_earned(customer_id).await?;
        let redeemed = self.lifetime_redeemed(customer_id).await?;
        checked_balance(customer_id, earned, redeemed)
    }

    /// Points credited since local midnight in the reference timezone.
    pub async fn today_earned(&self, customer_id: &str) -> Result<i64> {
        self.today_earned_at(customer_id, self.clock.now()).await
    }

    /// Points credited in the local day containing `now`, up to `now`.
    pub async fn today_earned_at(&self, customer_id: &str, now: DateTime<Utc>) -> Result<i64> {
        let today = self.window.today(now);
        Ok(self.store.earned_points(customer_id, Some(today)).await?)
    }

    pub async fn lifetime_earned(&self, customer_id: &str) -> Result<i64> {
        Ok(self.store.earned_points(customer_id, None).await?)
    }

    pub async fn lifetime_redeemed(&self, customer_id: &str) -> Result<i64> {
        Ok(self.store.redeemed_points(customer_id).await?)
    }

    pub async fn totals(&self, customer_id: &str) -> Result<LedgerTotals> {
        let lifetime_earned_points = self.lifetime_earned(customer_id).await?;
        let lifetime_redeemed_points = self.lifetime_redeemed(customer_id).await?;
        let balance_points =
            checked_balance(customer_id, lifetime_earned_points, lifetime_redeemed_points)?;
        let today_earned_points = self.today_earned(customer_id).await?;

        Ok(LedgerTotals {
            balance_points,
            today_earned_points,
            lifetime_earned_points,
            lifetime_redeemed_points,
        })
    }

    pub async fn history(&self, customer_id: &str) -> Result<Vec<LedgerEntry>> {
        Ok(self.store.entries(customer_id).await?)
    }
}

fn checked_balance(customer_id: &str, earned: i64, redeemed: i64) -> Result<i64> {
    let balance = earned - redeemed;
    if balance < 0 {
        error!(
            customer_id = %customer_id,
            earned,
            redeemed,
            "Ledger invariant violated: negative balance"
        );
        return Err(LoyaltyError::Internal(format!(
            "{} for {}",
            errmsg::NEGATIVE_BALANCE,
            customer_id
        )));
    }
    Ok(balance)
}

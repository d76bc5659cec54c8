//! Earn/redeem engine.
//!
//! Applies the points rules on top of the ledger. Each mutation holds the
//! customer's lock across its read-aggregate/append sequence, so concurrent
//! earns cannot jointly exceed the daily cap and concurrent redeems cannot
//! overdraw the balance.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::LedgerConfig;
use crate::error::{LoyaltyError, Result};
use crate::ledger::Ledger;
use crate::model::{EarnEvent, RedeemEvent};
use crate::utils::KeyedLocks;

/// Fixed accounting constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsRules {
    /// Maximum points creditable per customer per local day.
    pub daily_cap: i64,
    /// Minor units per point.
    pub earn_rate: i64,
}

impl PointsRules {
    /// Points a purchase of `amount_minor` would earn before the cap.
    pub fn requested_points(&self, amount_minor: i64) -> i64 {
        amount_minor.div_euclid(self.earn_rate)
    }
}

impl Default for PointsRules {
    fn default() -> Self {
        Self {
            daily_cap: 5000,
            earn_rate: 100,
        }
    }
}

impl From<&LedgerConfig> for PointsRules {
    fn from(config: &LedgerConfig) -> Self {
        Self {
            daily_cap: config.daily_cap,
            earn_rate: config.earn_rate,
        }
    }
}

/// Result of a successful earn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnReceipt {
    pub credited_points: i64,
    /// Allowance left today after this credit.
    pub remaining_daily_allowance: i64,
    pub transaction: EarnEvent,
}

/// Result of a successful redeem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemReceipt {
    pub new_balance: i64,
    pub redemption: RedeemEvent,
}

pub struct PointsEngine {
    ledger: Ledger,
    rules: PointsRules,
    locks: Arc<KeyedLocks>,
}

impl PointsEngine {
    pub fn new(ledger: Ledger, rules: PointsRules) -> Self {
        Self {
            ledger,
            rules,
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Per-customer lock table, shared with the reaper for pruning.
    pub fn locks(&self) -> Arc<KeyedLocks> {
        self.locks.clone()
    }

    /// Credit points for a purchase, clamped to today's remaining allowance.
    ///
    /// Points over the cap are dropped, not carried over. Earning zero
    /// points is a valid outcome and still records an event.
    /// `amount_minor` must be non-negative (validated upstream). The event is
    /// stamped with the same instant the daily window is judged at.
    pub async fn earn(&self, customer_id: &str, amount_minor: i64) -> Result<EarnReceipt> {
        let _guard = self.locks.lock(customer_id).await;
        let now = self.ledger.now();

        let requested = self.rules.requested_points(amount_minor);
        let today_earned = self.ledger.today_earned_at(customer_id, now).await?;
        let remaining = (self.rules.daily_cap - today_earned).max(0);
        let credited = requested.min(remaining);

        let transaction = self
            .ledger
            .store()
            .record_earn(customer_id, amount_minor, credited, now)
            .await?;

        if credited < requested {
            debug!(
                customer_id = %customer_id,
                requested,
                credited,
                "Daily cap clamped earn"
            );
        }
        info!(
            customer_id = %customer_id,
            transaction_id = %transaction.id,
            credited,
            "Points earned"
        );

        Ok(EarnReceipt {
            credited_points: credited,
            remaining_daily_allowance: remaining - credited,
            transaction,
        })
    }

    /// Remove `points` from the balance, or fail without partial redemption.
    ///
    /// `points` must be positive (validated upstream).
    pub async fn redeem(&self, customer_id: &str, points: i64) -> Result<RedeemReceipt> {
        let _guard = self.locks.lock(customer_id).await;

        let balance = self.ledger.balance(customer_id).await?;
        if balance < points {
            info!(
                customer_id = %customer_id,
                balance,
                requested = points,
                "Redeem rejected: insufficient points"
            );
            return Err(LoyaltyError::InsufficientPoints {
                available: balance,
                requested: points,
            });
        }

        let redemption = self
            .ledger
            .store()
            .record_redeem(customer_id, points, self.ledger.now())
            .await?;

        info!(
            customer_id = %customer_id,
            redemption_id = %redemption.id,
            points,
            "Points redeemed"
        );

        Ok(RedeemReceipt {
            new_balance: balance - points,
            redemption,
        })
    }
}

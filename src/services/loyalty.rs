//! Request-layer facade.
//!
//! Parses JSON request bodies, validates them, and routes mutations through
//! the idempotency guard before they reach the points engine. Reads go
//! straight to the ledger.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::idempotency::{Fingerprint, IdempotencyGuard, IdempotencyReaper};
use super::points::{EarnReceipt, PointsEngine, PointsRules};
use crate::clock::Clock;
use crate::config::{Config, ConfigError};
use crate::error::{errmsg, LoyaltyError, Result};
use crate::interfaces::CustomerDirectory;
use crate::ledger::{DailyWindow, Ledger, LedgerTotals};
use crate::model::{Customer, LedgerEntry};
use crate::storage::Stores;
use crate::validation::{
    require_present, validate_amount_minor, validate_currency, validate_customer_id,
    validate_idempotency_key, validate_points,
};

pub const CUSTOMERS_PATH: &str = "/customers";
pub const EARN_PATH: &str = "/earn";
pub const REDEEM_PATH: &str = "/redeem";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EarnResponse<'a> {
    customer_id: &'a str,
    #[serde(flatten)]
    receipt: EarnReceipt,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RedeemResponse<'a> {
    customer_id: &'a str,
    redeemed_points: i64,
    new_balance: i64,
}

/// Balance and aggregates for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub customer_id: String,
    #[serde(flatten)]
    pub totals: LedgerTotals,
}

struct EarnRequest<'a> {
    customer_id: &'a str,
    amount_minor: i64,
    currency: &'a str,
}

impl<'a> EarnRequest<'a> {
    fn parse(body: &'a Value) -> Result<Self> {
        let missing = errmsg::EARN_FIELDS_REQUIRED;
        let customer_id = validate_customer_id(str_field(body, "customerId"), missing)?;
        let currency = require_present(str_field(body, "currency"), missing)?;
        let amount_minor = body
            .get("amountMinor")
            .and_then(Value::as_i64)
            .ok_or_else(|| LoyaltyError::InvalidRequest(missing.to_string()))?;
        Ok(Self {
            customer_id,
            amount_minor: validate_amount_minor(amount_minor)?,
            currency,
        })
    }
}

struct RedeemRequest<'a> {
    customer_id: &'a str,
    points: i64,
}

impl<'a> RedeemRequest<'a> {
    fn parse(body: &'a Value) -> Result<Self> {
        let missing = errmsg::REDEEM_FIELDS_REQUIRED;
        let customer_id = validate_customer_id(str_field(body, "customerId"), missing)?;
        let points = body
            .get("points")
            .and_then(Value::as_i64)
            .ok_or_else(|| LoyaltyError::InvalidRequest(missing.to_string()))?;
        Ok(Self {
            customer_id,
            points: validate_points(points)?,
        })
    }
}

fn str_field<'a>(body: &'a Value, name: &str) -> Option<&'a str> {
    body.get(name).and_then(Value::as_str)
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| LoyaltyError::Internal(e.to_string()))
}

pub struct LoyaltyService {
    customers: Arc<dyn CustomerDirectory>,
    engine: PointsEngine,
    guard: Arc<IdempotencyGuard>,
    currency: String,
}

impl LoyaltyService {
    /// Assemble the service from its stores and a validated config.
    pub fn new(
        stores: Stores,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> std::result::Result<Self, ConfigError> {
        let window = DailyWindow::new(config.ledger.tz()?);
        let ledger = Ledger::new(stores.ledger, window, clock.clone());
        let engine = PointsEngine::new(ledger, PointsRules::from(&config.ledger));
        let guard = IdempotencyGuard::new(stores.idempotency, clock)
            .with_ttl(config.idempotency.ttl());

        Ok(Self {
            customers: stores.customers,
            engine,
            guard: Arc::new(guard),
            currency: config.ledger.currency.clone(),
        })
    }

    /// Reaper for expired idempotency records and idle key and customer locks.
    pub fn reaper(&self) -> IdempotencyReaper {
        IdempotencyReaper::new(self.guard.clone()).with_locks(self.engine.locks())
    }

    pub fn ledger(&self) -> &Ledger {
        self.engine.ledger()
    }

    /// Register a customer, or return the one already holding `phone`.
    pub async fn create_customer(&self, body: &Value) -> Result<Customer> {
        let phone = require_present(str_field(body, "phone"), errmsg::CUSTOMER_FIELDS_REQUIRED)?;
        let email = require_present(str_field(body, "email"), errmsg::CUSTOMER_FIELDS_REQUIRED)?;

        let customer = self.customers.create_or_get(phone, email).await?;
        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    pub async fn earn(&self, idempotency_key: Option<&str>, body: &Value) -> Result<Value> {
        let key = validate_idempotency_key(idempotency_key)?;
        let fingerprint = Fingerprint::new("POST", EARN_PATH, body);

        self.guard
            .execute(key, fingerprint, || async {
                let request = EarnRequest::parse(body)?;
                validate_currency(request.currency, &self.currency)?;
                self.require_customer(request.customer_id).await?;

                let receipt = self
                    .engine
                    .earn(request.customer_id, request.amount_minor)
                    .await?;
                to_json(&EarnResponse {
                    customer_id: request.customer_id,
                    receipt,
                })
            })
            .await
    }

    pub async fn redeem(&self, idempotency_key: Option<&str>, body: &Value) -> Result<Value> {
        let key = validate_idempotency_key(idempotency_key)?;
        let fingerprint = Fingerprint::new("POST", REDEEM_PATH, body);

        self.guard
            .execute(key, fingerprint, || async {
                let request = RedeemRequest::parse(body)?;
                self.require_customer(request.customer_id).await?;

                let receipt = self
                    .engine
                    .redeem(request.customer_id, request.points)
                    .await?;
                to_json(&RedeemResponse {
                    customer_id: request.customer_id,
                    redeemed_points: receipt.redemption.points,
                    new_balance: receipt.new_balance,
                })
            })
            .await
    }

    pub async fn wallet_summary(&self, customer_id: &str) -> Result<WalletSummary> {
        self.require_customer(customer_id).await?;
        let totals = self.engine.ledger().totals(customer_id).await?;
        Ok(WalletSummary {
            customer_id: customer_id.to_string(),
            totals,
        })
    }

    /// Append-order history of earn and redeem events.
    pub async fn transactions(&self, customer_id: &str) -> Result<Vec<LedgerEntry>> {
        self.require_customer(customer_id).await?;
        self.engine.ledger().history(customer_id).await
    }

    async fn require_customer(&self, customer_id: &str) -> Result<Customer> {
        match self.customers.get(customer_id).await? {
            Some(customer) => Ok(customer),
            None => {
                debug!(customer_id = %customer_id, "Unknown customer");
                Err(LoyaltyError::CustomerNotFound {
                    id: customer_id.to_string(),
                })
            }
        }
    }
}

//! Loyalty points ledger.
//!
//! Append-only earn/redeem ledger with a per-customer daily earn cap
//! measured in a fixed reference timezone, and an idempotency guard that
//! makes retried mutations safe.

pub mod clock;
pub mod config;
pub mod error;
pub mod interfaces;
pub mod ledger;
pub mod model;
pub mod services;
pub mod storage;
pub mod utils;
pub mod validation;

pub use error::{LoyaltyError, Result};
pub use services::LoyaltyService;

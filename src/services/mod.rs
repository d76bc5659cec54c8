//! Earn/redeem engine, idempotency guard and the request-layer facade.

pub mod idempotency;
pub mod loyalty;
pub mod points;
pub mod router;

pub use idempotency::{Fingerprint, IdempotencyGuard, IdempotencyReaper, ReapStats};
pub use loyalty::{LoyaltyService, WalletSummary};
pub use points::{EarnReceipt, PointsEngine, PointsRules, RedeemReceipt};
pub use router::{dispatch, dispatch_line, serve, Request, Response};

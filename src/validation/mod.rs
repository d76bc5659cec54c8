//! Input validation for request fields.
//!
//! Everything that crosses the request boundary is checked here before it
//! reaches the engine: idempotency keys, identifiers, amounts and currency.

use crate::error::{LoyaltyError, Result};

/// Length limits for validated fields.
pub mod limits {
    /// Maximum idempotency key length.
    pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 255;
    /// Maximum customer identifier length.
    pub const MAX_CUSTOMER_ID_LENGTH: usize = 128;
}

/// Error constants for validation failures.
pub mod errmsg {
    pub const IDEMPOTENCY_KEY_TOO_LONG: &str = "Idempotency-Key exceeds maximum length";
    pub const IDEMPOTENCY_KEY_INVALID_CHARS: &str =
        "Idempotency-Key contains invalid characters (allowed: visible ASCII)";
    pub const CUSTOMER_ID_TOO_LONG: &str = "customerId exceeds maximum length";
    pub const AMOUNT_NEGATIVE: &str = "amountMinor must not be negative";
    pub const POINTS_POSITIVE: &str = "points must be a positive integer";
}

/// Validate an idempotency key.
///
/// Rules:
/// - Must be present and non-empty
/// - Maximum 255 characters
/// - Visible ASCII only (no whitespace or control characters)
///
/// The key is used exactly as sent. Surrounding whitespace is rejected,
/// not stripped, so `" k-1"` never aliases `"k-1"`.
pub fn validate_idempotency_key(key: Option<&str>) -> Result<&str> {
    let key = match key {
        Some(k) if !k.is_empty() => k,
        _ => return Err(LoyaltyError::MissingIdempotencyKey),
    };
    if key.len() > limits::MAX_IDEMPOTENCY_KEY_LENGTH {
        return Err(LoyaltyError::InvalidRequest(format!(
            "{} (max: {}, got: {})",
            errmsg::IDEMPOTENCY_KEY_TOO_LONG,
            limits::MAX_IDEMPOTENCY_KEY_LENGTH,
            key.len()
        )));
    }
    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(LoyaltyError::InvalidRequest(
            errmsg::IDEMPOTENCY_KEY_INVALID_CHARS.to_string(),
        ));
    }
    Ok(key)
}

/// Require a non-empty string field, reporting `missing` otherwise.
pub fn require_present<'a>(value: Option<&'a str>, missing: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LoyaltyError::InvalidRequest(missing.to_string())),
    }
}

/// Validate a customer identifier.
pub fn validate_customer_id<'a>(id: Option<&'a str>, missing: &str) -> Result<&'a str> {
    let id = require_present(id, missing)?;
    if id.len() > limits::MAX_CUSTOMER_ID_LENGTH {
        return Err(LoyaltyError::InvalidRequest(format!(
            "{} (max: {}, got: {})",
            errmsg::CUSTOMER_ID_TOO_LONG,
            limits::MAX_CUSTOMER_ID_LENGTH,
            id.len()
        )));
    }
    Ok(id)
}

/// Validate a purchase amount in minor units (>= 0).
pub fn validate_amount_minor(amount: i64) -> Result<i64> {
    if amount < 0 {
        return Err(LoyaltyError::InvalidRequest(
            errmsg::AMOUNT_NEGATIVE.to_string(),
        ));
    }
    Ok(amount)
}

/// Validate a redemption size (> 0).
pub fn validate_points(points: i64) -> Result<i64> {
    if points <= 0 {
        return Err(LoyaltyError::InvalidRequest(
            errmsg::POINTS_POSITIVE.to_string(),
        ));
    }
    Ok(points)
}

/// Only the configured currency may earn points.
pub fn validate_currency(currency: &str, accepted: &str) -> Result<()> {
    if currency != accepted {
        return Err(LoyaltyError::InvalidCurrency {
            currency: currency.to_string(),
        });
    }
    Ok(())
}

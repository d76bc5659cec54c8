//! Service-level error taxonomy.
//!
//! Every variant except `Internal` is an expected, user-facing outcome that
//! leaves the ledger untouched. `Internal` means a broken invariant or a
//! storage failure and is logged where it is raised.

use serde::Serialize;

use crate::interfaces::StorageError;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, LoyaltyError>;

/// Error message constants.
pub mod errmsg {
    pub const CUSTOMER_NOT_FOUND: &str = "Customer does not exist";
    pub const INSUFFICIENT_POINTS: &str = "Not enough points to redeem";
    pub const IDEMPOTENCY_CONFLICT: &str =
        "Idempotency key used with different request parameters";
    pub const MISSING_IDEMPOTENCY_KEY: &str = "Idempotency-Key header is required";
    pub const EARN_FIELDS_REQUIRED: &str = "customerId, amountMinor, and currency are required";
    pub const REDEEM_FIELDS_REQUIRED: &str = "customerId and points are required";
    pub const CUSTOMER_FIELDS_REQUIRED: &str = "phone and email are required";
    pub const UNSUPPORTED_CURRENCY: &str = "currency is not supported";
    pub const NEGATIVE_BALANCE: &str = "ledger balance is negative";
}

/// Coarse classification used by the request layer for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InsufficientPoints,
    IdempotencyConflict,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoyaltyError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid currency: {currency} ({})", errmsg::UNSUPPORTED_CURRENCY)]
    InvalidCurrency { currency: String },

    #[error("{}", errmsg::MISSING_IDEMPOTENCY_KEY)]
    MissingIdempotencyKey,

    #[error("{}: {id}", errmsg::CUSTOMER_NOT_FOUND)]
    CustomerNotFound { id: String },

    #[error("{}: have {available}, need {requested}", errmsg::INSUFFICIENT_POINTS)]
    InsufficientPoints { available: i64, requested: i64 },

    #[error("{}: key={key}", errmsg::IDEMPOTENCY_CONFLICT)]
    IdempotencyConflict { key: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoyaltyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoyaltyError::InvalidRequest(_)
            | LoyaltyError::InvalidCurrency { .. }
            | LoyaltyError::MissingIdempotencyKey => ErrorKind::Validation,
            LoyaltyError::CustomerNotFound { .. } => ErrorKind::NotFound,
            LoyaltyError::InsufficientPoints { .. } => ErrorKind::InsufficientPoints,
            LoyaltyError::IdempotencyConflict { .. } => ErrorKind::IdempotencyConflict,
            LoyaltyError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LoyaltyError::InvalidRequest(_) => "INVALID_REQUEST",
            LoyaltyError::InvalidCurrency { .. } => "INVALID_CURRENCY",
            LoyaltyError::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            LoyaltyError::CustomerNotFound { .. } => "CUSTOMER_NOT_FOUND",
            LoyaltyError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            LoyaltyError::IdempotencyConflict { .. } => "IDEMPOTENCY_CONFLICT",
            LoyaltyError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<StorageError> for LoyaltyError {
    fn from(e: StorageError) -> Self {
        LoyaltyError::Internal(e.to_string())
    }
}

/// Serializable error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_points_is_distinct_from_validation() {
        let err = LoyaltyError::InsufficientPoints {
            available: 0,
            requested: 1,
        };
        assert_eq!(err.kind(), ErrorKind::InsufficientPoints);
        assert_eq!(err.code(), "INSUFFICIENT_POINTS");
        assert!(err.to_string().contains("have 0, need 1"));
    }

    #[test]
    fn test_conflict_is_distinct_from_validation() {
        let err = LoyaltyError::IdempotencyConflict {
            key: "k-1".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::IdempotencyConflict);
        assert_ne!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_validation_kinds() {
        for err in [
            LoyaltyError::InvalidRequest("x".to_string()),
            LoyaltyError::InvalidCurrency {
                currency: "USD".to_string(),
            },
            LoyaltyError::MissingIdempotencyKey,
        ] {
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_storage_error_is_internal() {
        let err: LoyaltyError = StorageError::DuplicateKey {
            key: "k".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_error_body_serializes() {
        let body = LoyaltyError::CustomerNotFound {
            id: "cust_9".to_string(),
        }
        .to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "CUSTOMER_NOT_FOUND");
        assert_eq!(json["message"], "Customer does not exist: cust_9");
    }
}

//! Ledger, customer and idempotency records.
//!
//! All records are immutable once created. Serialized field names are
//! camelCase since these structs are embedded verbatim in response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A loyalty customer. Phone number is unique across the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Points credited for a monetary transaction.
///
/// `points` is the credited amount after daily-cap clamping, never the
/// requested amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnEvent {
    pub id: String,
    pub customer_id: String,
    pub amount_minor: i64,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// Points removed from a customer's balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemEvent {
    pub id: String,
    pub customer_id: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

/// One row of a customer's ledger history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LedgerEntry {
    Earn(EarnEvent),
    Redeem(RedeemEvent),
}

impl LedgerEntry {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEntry::Earn(e) => e.created_at,
            LedgerEntry::Redeem(r) => r.created_at,
        }
    }

    /// Signed effect on the balance.
    pub fn delta(&self) -> i64 {
        match self {
            LedgerEntry::Earn(e) => e.points,
            LedgerEntry::Redeem(r) => -r.points,
        }
    }
}

/// Inclusive time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// Outcome of the first successful use of an idempotency key.
#[derive(Debug, Clone, PartialEq)]
pub struct IdempotencyRecord {
    pub key: String,
    pub method: String,
    pub path: String,
    /// Canonical JSON of the request body.
    pub body: String,
    /// SHA-256 hex digest of (method, path, body).
    pub fingerprint: String,
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_time_window_is_inclusive() {
        let window = TimeWindow {
            start: ts("2024-03-09T23:00:00Z"),
            end: ts("2024-03-10T12:00:00Z"),
        };
        assert!(window.contains(ts("2024-03-09T23:00:00Z")));
        assert!(window.contains(ts("2024-03-10T12:00:00Z")));
        assert!(!window.contains(ts("2024-03-09T22:59:59Z")));
        assert!(!window.contains(ts("2024-03-10T12:00:01Z")));
    }

    #[test]
    fn test_earn_event_serializes_camel_case() {
        let event = EarnEvent {
            id: "tx_001".to_string(),
            customer_id: "cust_1".to_string(),
            amount_minor: 250,
            points: 2,
            created_at: ts("2024-03-10T09:00:00Z"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["customerId"], "cust_1");
        assert_eq!(json["amountMinor"], 250);
        assert_eq!(json["createdAt"], "2024-03-10T09:00:00Z");
    }

    #[test]
    fn test_ledger_entry_delta() {
        let redeem = LedgerEntry::Redeem(RedeemEvent {
            id: "red_001".to_string(),
            customer_id: "cust_1".to_string(),
            points: 40,
            created_at: ts("2024-03-10T09:00:00Z"),
        });
        assert_eq!(redeem.delta(), -40);
    }
}

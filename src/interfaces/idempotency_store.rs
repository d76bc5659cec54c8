//! Idempotency record storage interface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;
use crate::model::IdempotencyRecord;

/// Keyed store of idempotency records.
///
/// Records are insert-only: `put` for an existing key fails with
/// `StorageError::DuplicateKey`. Removal only happens through expiry.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<IdempotencyRecord>>;

    async fn put(&self, record: IdempotencyRecord) -> Result<()>;

    /// Remove a single record (expired-record cleanup).
    async fn remove(&self, key: &str) -> Result<()>;

    /// Delete every record created before `cutoff`. Returns the number removed.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

//! Idempotency guard for mutating operations.
//!
//! A key moves from absent to recorded exactly once. The check, the guarded
//! operation and the store of its response run as one critical section per
//! key: a second caller with the same key blocks until the first finishes,
//! then replays the recorded response (or executes, if the first attempt
//! failed and recorded nothing).
//!
//! Lock order: the idempotency-key lock is always taken before any
//! per-customer ledger lock.

mod fingerprint;
mod reaper;

pub use fingerprint::{canonical_json, Fingerprint};
pub use reaper::{IdempotencyReaper, ReapStats};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::error::{LoyaltyError, Result};
use crate::interfaces::IdempotencyStore;
use crate::model::IdempotencyRecord;
use crate::utils::KeyedLocks;

pub struct IdempotencyGuard {
    store: Arc<dyn IdempotencyStore>,
    locks: KeyedLocks,
    clock: Arc<dyn Clock>,
    ttl: Option<chrono::Duration>,
}

impl IdempotencyGuard {
    /// Guard whose records never expire.
    pub fn new(store: Arc<dyn IdempotencyStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            locks: KeyedLocks::new(),
            clock,
            ttl: None,
        }
    }

    /// Records older than `ttl` are treated as absent.
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl.and_then(|d| chrono::Duration::from_std(d).ok());
        self
    }

    pub fn ttl(&self) -> Option<chrono::Duration> {
        self.ttl
    }

    /// Look up a prior response for `key`.
    ///
    /// Fails with `IdempotencyConflict` when the key was first used with a
    /// different fingerprint.
    pub async fn check(&self, key: &str, fingerprint: &Fingerprint) -> Result<Option<Value>> {
        let Some(record) = self.store.get(key).await? else {
            return Ok(None);
        };

        if self.is_expired(&record) {
            debug!(idempotency_key = %key, "Idempotency record expired");
            self.store.remove(key).await?;
            return Ok(None);
        }

        let stored = Fingerprint::from_parts(&record.method, &record.path, &record.body);
        if stored != *fingerprint {
            warn!(
                idempotency_key = %key,
                stored = %record.fingerprint,
                incoming = %fingerprint.digest(),
                "Idempotency key reused with different request parameters"
            );
            return Err(LoyaltyError::IdempotencyConflict {
                key: key.to_string(),
            });
        }

        Ok(Some(record.response))
    }

    /// Record the response of the first successful execution for `key`.
    pub async fn store(&self, key: &str, fingerprint: &Fingerprint, response: &Value) -> Result<()> {
        let record = IdempotencyRecord {
            key: key.to_string(),
            method: fingerprint.method().to_string(),
            path: fingerprint.path().to_string(),
            body: fingerprint.body().to_string(),
            fingerprint: fingerprint.digest(),
            response: response.clone(),
            created_at: self.clock.now(),
        };
        self.store.put(record).await?;
        Ok(())
    }

    /// Run `op` at most once per key and fingerprint.
    ///
    /// On a recorded key with a matching fingerprint the stored response is
    /// returned verbatim and `op` is not called. Failures from `op` are not
    /// recorded.
    pub async fn execute<F, Fut>(&self, key: &str, fingerprint: Fingerprint, op: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let _guard = self.locks.lock(key).await;

        if let Some(prior) = self.check(key, &fingerprint).await? {
            info!(
                idempotency_key = %key,
                path = %fingerprint.path(),
                "Replaying recorded response"
            );
            return Ok(prior);
        }

        let response = op().await?;

        if let Err(e) = self.store(key, &fingerprint, &response).await {
            // The mutation already happened; a retry would apply it again.
            error!(idempotency_key = %key, error = %e, "Failed to record idempotency response");
            return Err(e);
        }

        Ok(response)
    }

    /// Delete expired records and prune idle key locks.
    pub async fn evict_expired(&self) -> Result<ReapStats> {
        let records = match self.ttl {
            Some(ttl) => {
                let cutoff = self.clock.now() - ttl;
                self.store.delete_older_than(cutoff).await?
            }
            None => 0,
        };
        let locks = self.locks.prune().await;
        Ok(ReapStats { records, locks })
    }

    fn is_expired(&self, record: &IdempotencyRecord) -> bool {
        self.ttl
            .is_some_and(|ttl| record.created_at + ttl <= self.clock.now())
    }
}

#[cfg(test)]
mod tests;

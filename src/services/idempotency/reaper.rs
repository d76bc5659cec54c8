//! TTL-based cleanup for expired idempotency records.
//!
//! Without a TTL on the guard it only prunes idle lock slots: the guard's
//! key locks and any extra lock tables attached with `with_locks`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::IdempotencyGuard;
use crate::error::Result;
use crate::utils::KeyedLocks;

/// What one reaper pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapStats {
    pub records: usize,
    pub locks: usize,
}

/// Background task that periodically evicts expired idempotency records.
pub struct IdempotencyReaper {
    guard: Arc<IdempotencyGuard>,
    locks: Vec<Arc<KeyedLocks>>,
    interval: Duration,
}

impl IdempotencyReaper {
    pub fn new(guard: Arc<IdempotencyGuard>) -> Self {
        Self {
            guard,
            locks: Vec::new(),
            interval: Duration::from_secs(3600),
        }
    }

    /// Set custom cleanup interval.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Also prune idle slots of `locks` on every pass.
    pub fn with_locks(mut self, locks: Arc<KeyedLocks>) -> Self {
        self.locks.push(locks);
        self
    }

    /// Spawn the reaper as a background task.
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                match self.run_once().await {
                    Ok(stats) if stats.records > 0 || stats.locks > 0 => {
                        info!(
                            deleted = stats.records,
                            pruned_locks = stats.locks,
                            "Idempotency reaper pass"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Idempotency reaper failed");
                    }
                }
            }
        })
    }

    /// Run cleanup once.
    pub async fn run_once(&self) -> Result<ReapStats> {
        let mut stats = self.guard.evict_expired().await?;
        for locks in &self.locks {
            stats.locks += locks.prune().await;
        }
        Ok(stats)
    }
}

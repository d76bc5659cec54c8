//! In-memory storage implementations.
//!
//! Process-local maps behind `tokio::sync::RwLock`. Identifiers come from
//! per-store atomic sequences so concurrent appends never collide.

use std::sync::atomic::{AtomicU64, Ordering};

mod customer_directory;
mod idempotency_store;
mod ledger_store;

pub use customer_directory::InMemoryCustomerDirectory;
pub use idempotency_store::InMemoryIdempotencyStore;
pub use ledger_store::InMemoryLedgerStore;

/// Monotonic identifier source owned by a single store.
#[derive(Debug)]
struct Sequence {
    next: AtomicU64,
}

impl Sequence {
    fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

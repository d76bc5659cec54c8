//! Storage implementations.

use std::sync::Arc;

use tracing::info;

use crate::clock::Clock;
use crate::config::{StorageConfig, StorageType};
use crate::interfaces::{CustomerDirectory, IdempotencyStore, LedgerStore};

pub mod memory;

pub use memory::{InMemoryCustomerDirectory, InMemoryIdempotencyStore, InMemoryLedgerStore};

/// The three stores the service is assembled from.
#[derive(Clone)]
pub struct Stores {
    pub customers: Arc<dyn CustomerDirectory>,
    pub ledger: Arc<dyn LedgerStore>,
    pub idempotency: Arc<dyn IdempotencyStore>,
}

/// Initialize storage based on configuration.
///
/// The customer directory stamps registrations from `clock`; ledger events
/// carry the instant chosen by the engine.
pub fn init_storage(config: &StorageConfig, clock: Arc<dyn Clock>) -> Stores {
    match config.storage_type {
        StorageType::Memory => {
            info!("Storage: in-memory (not persisted across restarts)");
            Stores {
                customers: Arc::new(InMemoryCustomerDirectory::new(clock)),
                ledger: Arc::new(InMemoryLedgerStore::new()),
                idempotency: Arc::new(InMemoryIdempotencyStore::new()),
            }
        }
    }
}

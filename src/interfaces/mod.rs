//! Storage seams.
//!
//! The service layer only ever talks to these traits. The in-memory
//! implementations live in [`crate::storage`].

pub mod customer_directory;
pub mod idempotency_store;
pub mod ledger_store;

pub use customer_directory::CustomerDirectory;
pub use idempotency_store::IdempotencyStore;
pub use ledger_store::LedgerStore;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Idempotency record already exists: key={key}")]
    DuplicateKey { key: String },
}

//! Pure utility functions and small concurrency helpers.

pub mod bootstrap;
pub mod keyed_lock;

pub use keyed_lock::KeyedLocks;

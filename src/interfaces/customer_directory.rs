//! Customer directory interface.

use async_trait::async_trait;

use super::Result;
use crate::model::Customer;

/// Keyed customer store with a unique phone index.
#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Create a customer, or return the existing one registered under `phone`
    /// unchanged.
    async fn create_or_get(&self, phone: &str, email: &str) -> Result<Customer>;

    async fn get(&self, id: &str) -> Result<Option<Customer>>;
}

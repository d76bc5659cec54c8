//! In-memory CustomerDirectory.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Sequence;
use crate::clock::Clock;
use crate::interfaces::{CustomerDirectory, Result};
use crate::model::Customer;

#[derive(Default)]
struct Directory {
    customers: HashMap<String, Customer>,
    /// phone -> customer id
    phone_index: HashMap<String, String>,
}

pub struct InMemoryCustomerDirectory {
    directory: RwLock<Directory>,
    seq: Sequence,
    clock: Arc<dyn Clock>,
}

impl InMemoryCustomerDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            directory: RwLock::new(Directory::default()),
            seq: Sequence::starting_at(1),
            clock,
        }
    }
}

#[async_trait]
impl CustomerDirectory for InMemoryCustomerDirectory {
    async fn create_or_get(&self, phone: &str, email: &str) -> Result<Customer> {
        // Single write lock so two creates for one phone cannot both insert.
        let mut directory = self.directory.write().await;

        if let Some(existing) = directory
            .phone_index
            .get(phone)
            .and_then(|id| directory.customers.get(id))
        {
            return Ok(existing.clone());
        }

        let customer = Customer {
            id: format!("cust_{}", self.seq.next()),
            phone: phone.to_string(),
            email: email.to_string(),
            created_at: self.clock.now(),
        };
        directory
            .phone_index
            .insert(phone.to_string(), customer.id.clone());
        directory
            .customers
            .insert(customer.id.clone(), customer.clone());
        Ok(customer)
    }

    async fn get(&self, id: &str) -> Result<Option<Customer>> {
        Ok(self.directory.read().await.customers.get(id).cloned())
    }
}

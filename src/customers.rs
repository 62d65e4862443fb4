//! Customer directory: owns the customer mapping.
//!
//! Customers are create-only; there is no update or delete operation.

use crate::error::PosError;
use crate::model::Customer;
use crate::store::{DataContext, JsonStore};
use std::collections::BTreeMap;

pub struct CustomerDirectory {
    customers: BTreeMap<String, Customer>,
    store: JsonStore<Customer>,
}

impl CustomerDirectory {
    pub fn load(ctx: &DataContext) -> Self {
        let store = JsonStore::new(ctx.customers_path());
        let customers = store.load_or_default();
        Self { customers, store }
    }

    pub fn add(&mut self, id: &str, name: &str) -> Result<(), PosError> {
        if self.customers.contains_key(id) {
            return Err(PosError::DuplicateId(id.to_string()));
        }

        self.customers.insert(
            id.to_string(),
            Customer {
                name: name.to_string(),
            },
        );
        tracing::debug!(id, name, "customer added");
        self.store.save(&self.customers).map_err(PosError::Store)
    }

    pub fn resolve(&self, id: &str) -> Option<&Customer> {
        self.customers.get(id)
    }

    /// (id, customer) pairs in mapping iteration order.
    pub fn list(&self) -> impl Iterator<Item = (&String, &Customer)> {
        self.customers.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }
}

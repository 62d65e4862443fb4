//! Catalog manager: owns the product mapping.
//!
//! Every mutation rewrites `products.json` in full. Persistence failures
//! are surfaced to the caller; the in-memory change stands either way.

use crate::error::PosError;
use crate::model::Product;
use crate::store::{DataContext, JsonStore};
use std::collections::BTreeMap;

pub struct Catalog {
    products: BTreeMap<String, Product>,
    store: JsonStore<Product>,
}

/// Parse a price entry: a finite, non-negative number.
pub fn parse_price(input: &str) -> Result<f64, PosError> {
    match input.trim().parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(PosError::InvalidPrice),
    }
}

impl Catalog {
    pub fn load(ctx: &DataContext) -> Self {
        let store = JsonStore::new(ctx.products_path());
        let products = store.load_or_default();
        Self { products, store }
    }

    /// Add a product under a new identifier.
    pub fn add(&mut self, id: &str, name: &str, price: f64) -> Result<(), PosError> {
        if !(price.is_finite() && price >= 0.0) {
            return Err(PosError::InvalidPrice);
        }
        if self.products.contains_key(id) {
            return Err(PosError::DuplicateId(id.to_string()));
        }

        self.products.insert(
            id.to_string(),
            Product {
                name: name.to_string(),
                price,
            },
        );
        tracing::debug!(id, name, price, "product added");
        self.persist()
    }

    /// Update a product in place.
    ///
    /// The name is replaced only when a non-empty replacement is given; the
    /// price only when a valid non-negative value is given. Any successful
    /// field change is persisted, even if the other field's input was
    /// invalid - an invalid price is reported after the name edit has been
    /// applied and saved.
    pub fn update(
        &mut self,
        id: &str,
        new_name: Option<&str>,
        new_price: Option<f64>,
    ) -> Result<(), PosError> {
        let Some(product) = self.products.get_mut(id) else {
            return Err(PosError::NotFound(id.to_string()));
        };

        let mut changed = false;
        if let Some(name) = new_name {
            if !name.is_empty() {
                product.name = name.to_string();
                changed = true;
            }
        }

        let mut bad_price = false;
        match new_price {
            Some(price) if price.is_finite() && price >= 0.0 => {
                product.price = price;
                changed = true;
            }
            Some(_) => bad_price = true,
            None => {}
        }

        if changed {
            tracing::debug!(id, "product updated");
            self.persist()?;
        }
        if bad_price {
            return Err(PosError::InvalidPrice);
        }
        Ok(())
    }

    pub fn delete(&mut self, id: &str) -> Result<(), PosError> {
        if self.products.remove(id).is_none() {
            return Err(PosError::NotFound(id.to_string()));
        }
        tracing::debug!(id, "product deleted");
        self.persist()
    }

    pub fn resolve(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// (id, product) pairs in mapping iteration order.
    pub fn list(&self) -> impl Iterator<Item = (&String, &Product)> {
        self.products.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    fn persist(&self) -> Result<(), PosError> {
        self.store.save(&self.products).map_err(PosError::Store)
    }
}

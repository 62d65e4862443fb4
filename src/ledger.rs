//! Receipt ledger: owns the receipt mapping.
//!
//! Receipts are appended at checkout under a generated identifier and are
//! immutable afterwards; the only removal is a bulk clear of the whole
//! ledger. Identifiers derive from the checkout timestamp (microseconds
//! since the Unix epoch, as a decimal string) and are bumped past the last
//! issued value so they stay strictly increasing even when the clock does
//! not advance between sales.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::error::PosError;
use crate::model::Receipt;
use crate::store::{DataContext, JsonStore};
use std::collections::BTreeMap;

pub struct ReceiptLedger {
    receipts: BTreeMap<String, Receipt>,
    store: JsonStore<Receipt>,
    last_tick: i64,
}

/// A receipt line item resolved against the current catalog. `name` is
/// `None` when the product has since been deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLine<'a> {
    pub product_id: &'a str,
    pub name: Option<&'a str>,
    pub quantity: u32,
}

/// A receipt together with its resolved line items.
#[derive(Debug, Clone)]
pub struct ResolvedReceipt<'a> {
    pub id: &'a str,
    pub receipt: &'a Receipt,
    pub lines: Vec<ResolvedLine<'a>>,
}

impl ReceiptLedger {
    pub fn load(ctx: &DataContext) -> Self {
        let store = JsonStore::new(ctx.receipts_path());
        let receipts = store.load_or_default();
        // Resume identifier generation past anything already on disk.
        let last_tick = receipts
            .keys()
            .filter_map(|k| k.parse::<i64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            receipts,
            store,
            last_tick,
        }
    }

    /// Record a completed sale and persist the whole ledger. Returns the
    /// generated receipt identifier.
    ///
    /// On a persistence failure the receipt is still recorded in memory;
    /// the caller reports the error and carries on.
    pub fn record_sale(
        &mut self,
        customer_id: &str,
        customer_name: &str,
        items: BTreeMap<String, u32>,
        total: f64,
        clock: &dyn Clock,
    ) -> Result<String, PosError> {
        let now = clock.now();
        let mut tick = now.timestamp_micros();
        if tick <= self.last_tick {
            tick = self.last_tick + 1;
        }
        self.last_tick = tick;
        let id = tick.to_string();

        let receipt = Receipt {
            customer_id: customer_id.to_string(),
            customer_name: customer_name.to_string(),
            items,
            total,
            timestamp: now,
        };
        self.receipts.insert(id.clone(), receipt);
        tracing::info!(receipt_id = %id, total, "sale recorded");

        self.store.save(&self.receipts).map_err(PosError::Store)?;
        Ok(id)
    }

    /// Receipts with line items resolved against the current catalog.
    pub fn list_resolved<'a>(&'a self, catalog: &'a Catalog) -> Vec<ResolvedReceipt<'a>> {
        self.receipts
            .iter()
            .map(|(id, receipt)| {
                let lines = receipt
                    .items
                    .iter()
                    .map(|(product_id, quantity)| ResolvedLine {
                        product_id: product_id.as_str(),
                        name: catalog.resolve(product_id).map(|p| p.name.as_str()),
                        quantity: *quantity,
                    })
                    .collect();
                ResolvedReceipt {
                    id: id.as_str(),
                    receipt,
                    lines,
                }
            })
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Receipt> {
        self.receipts.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.receipts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.receipts.len()
    }

    /// Empty the ledger and persist the empty document.
    pub fn clear_all(&mut self) -> Result<(), PosError> {
        self.receipts.clear();
        tracing::info!("receipt ledger cleared");
        self.store.save(&self.receipts).map_err(PosError::Store)
    }
}

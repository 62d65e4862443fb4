//! Entity records persisted to the JSON documents.
//!
//! Field names are PascalCase on disk (`Name`, `Price`, `CustomerId`, ...)
//! so existing data files keep loading unchanged. Identifiers are not part
//! of the records; they are the keys of the surrounding mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sellable product. Keyed by a caller-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    pub name: String,
    /// Unit price. Non-negative and finite; validated on entry.
    pub price: f64,
}

/// A known customer. Keyed by a caller-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub name: String,
}

/// An immutable record of a completed sale. Keyed by a generated
/// timestamp-derived identifier.
///
/// The customer name is captured at checkout time and never re-resolved,
/// and the total is the sum of price-at-checkout times quantity; later
/// catalog edits do not touch recorded receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Receipt {
    pub customer_id: String,
    pub customer_name: String,
    /// Product identifier -> purchased quantity.
    pub items: BTreeMap<String, u32>,
    pub total: f64,
    pub timestamp: DateTime<Utc>,
}

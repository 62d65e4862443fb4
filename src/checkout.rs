//! Checkout engine: cart accumulation and receipt emission.
//!
//! A `CheckoutSession` moves through SelectingCustomer -> BuildingCart ->
//! Finalized | Canceled. The session is mutated only through its typed
//! operations; the interactive layer just feeds it prompt input.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::customers::CustomerDirectory;
use crate::error::PosError;
use crate::ledger::ReceiptLedger;
use std::collections::BTreeMap;

/// Sentinel customer used when the operator leaves the customer prompt
/// empty. Never stored in the customer directory.
pub const GUEST_ID: &str = "guest";
pub const GUEST_NAME: &str = "Guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    SelectingCustomer,
    BuildingCart,
    Finalized,
    Canceled,
}

/// Outcome of feeding one line of input to the customer prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerStep {
    /// Customer picked (or guest); the session is now building the cart.
    Resolved,
    /// The operator asked for the customer listing; prompt again.
    ListRequested,
    /// Unknown identifier; prompt again.
    NotFound,
}

pub struct CheckoutSession {
    state: CheckoutState,
    customer_id: String,
    customer_name: String,
    cart: BTreeMap<String, u32>,
}

/// Parse a quantity entry: a strictly positive integer.
pub fn parse_quantity(input: &str) -> Result<u32, PosError> {
    match input.trim().parse::<u32>() {
        Ok(quantity) if quantity > 0 => Ok(quantity),
        _ => Err(PosError::InvalidQuantity),
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::SelectingCustomer,
            customer_id: String::new(),
            customer_name: String::new(),
            cart: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn cart(&self) -> &BTreeMap<String, u32> {
        &self.cart
    }

    /// Feed one line of customer-prompt input. Empty input selects the
    /// guest sentinel; `list` requests a customer listing; anything else
    /// must resolve in the directory.
    pub fn select_customer(&mut self, input: &str, directory: &CustomerDirectory) -> CustomerStep {
        let input = input.trim();
        if input.eq_ignore_ascii_case("list") {
            return CustomerStep::ListRequested;
        }
        if input.is_empty() {
            self.customer_id = GUEST_ID.to_string();
            self.customer_name = GUEST_NAME.to_string();
            self.state = CheckoutState::BuildingCart;
            return CustomerStep::Resolved;
        }
        match directory.resolve(input) {
            Some(customer) => {
                self.customer_id = input.to_string();
                self.customer_name = customer.name.clone();
                self.state = CheckoutState::BuildingCart;
                CustomerStep::Resolved
            }
            None => CustomerStep::NotFound,
        }
    }

    /// Add a quantity of a product to the cart, accumulating onto any
    /// existing entry for the same product.
    pub fn add_item(&mut self, product_id: &str, quantity: u32) {
        *self.cart.entry(product_id.to_string()).or_insert(0) += quantity;
    }

    /// Total at current catalog prices.
    pub fn total(&self, catalog: &Catalog) -> f64 {
        self.cart
            .iter()
            .filter_map(|(id, quantity)| {
                catalog.resolve(id).map(|p| p.price * f64::from(*quantity))
            })
            .sum()
    }

    /// Discard the cart. No store is touched.
    pub fn cancel(&mut self) {
        self.state = CheckoutState::Canceled;
    }

    /// Finalize the sale: compute the total at current catalog prices and
    /// record the receipt. Returns the generated receipt identifier.
    pub fn finish(
        &mut self,
        catalog: &Catalog,
        ledger: &mut ReceiptLedger,
        clock: &dyn Clock,
    ) -> Result<String, PosError> {
        let total = self.total(catalog);
        self.state = CheckoutState::Finalized;
        ledger.record_sale(
            &self.customer_id,
            &self.customer_name,
            self.cart.clone(),
            total,
            clock,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::DataContext;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use tempfile::TempDir;

    struct Fixture {
        catalog: Catalog,
        customers: CustomerDirectory,
        ledger: ReceiptLedger,
        clock: FixedClock,
        _temp: TempDir,
    }

    fn create_test_fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let ctx = DataContext::for_testing(temp.path());
        let mut catalog = Catalog::load(&ctx);
        catalog.add("p1", "Widget", 9.99).unwrap();
        catalog.add("p2", "Gadget", 1.50).unwrap();
        let mut customers = CustomerDirectory::load(&ctx);
        customers.add("c1", "Alice").unwrap();
        Fixture {
            catalog,
            customers,
            ledger: ReceiptLedger::load(&ctx),
            clock: FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap()),
            _temp: temp,
        }
    }

    #[test]
    fn widget_scenario_records_the_expected_receipt() {
        let mut fx = create_test_fixture();
        let mut session = CheckoutSession::new();

        assert_eq!(
            session.select_customer("c1", &fx.customers),
            CustomerStep::Resolved
        );
        assert_eq!(session.state(), CheckoutState::BuildingCart);

        session.add_item("p1", 3);
        let id = session
            .finish(&fx.catalog, &mut fx.ledger, &fx.clock)
            .unwrap();

        assert_eq!(session.state(), CheckoutState::Finalized);
        let receipt = fx.ledger.get(&id).unwrap();
        assert!((receipt.total - 29.97).abs() < 1e-9);
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items.get("p1"), Some(&3));
        assert_eq!(receipt.customer_name, "Alice");
        assert_eq!(receipt.customer_id, "c1");
    }

    #[test]
    fn empty_customer_input_resolves_to_guest() {
        let mut fx = create_test_fixture();
        let mut session = CheckoutSession::new();

        assert_eq!(
            session.select_customer("  ", &fx.customers),
            CustomerStep::Resolved
        );
        assert_eq!(session.customer_id(), GUEST_ID);
        assert_eq!(session.customer_name(), GUEST_NAME);

        session.add_item("p2", 1);
        let id = session
            .finish(&fx.catalog, &mut fx.ledger, &fx.clock)
            .unwrap();
        assert_eq!(fx.ledger.get(&id).unwrap().customer_name, "Guest");
    }

    #[test]
    fn list_and_unknown_customer_keep_the_session_selecting() {
        let fx = create_test_fixture();
        let mut session = CheckoutSession::new();

        assert_eq!(
            session.select_customer("LIST", &fx.customers),
            CustomerStep::ListRequested
        );
        assert_eq!(session.state(), CheckoutState::SelectingCustomer);

        assert_eq!(
            session.select_customer("c9", &fx.customers),
            CustomerStep::NotFound
        );
        assert_eq!(session.state(), CheckoutState::SelectingCustomer);

        // The loop recovers once a valid identifier arrives.
        assert_eq!(
            session.select_customer("c1", &fx.customers),
            CustomerStep::Resolved
        );
    }

    #[test]
    fn quantities_accumulate_for_the_same_product() {
        let fx = create_test_fixture();
        let mut session = CheckoutSession::new();
        session.select_customer("", &fx.customers);

        session.add_item("p1", 2);
        session.add_item("p2", 1);
        session.add_item("p1", 5);

        assert_eq!(session.cart().get("p1"), Some(&7));
        assert_eq!(session.cart().get("p2"), Some(&1));
        assert!((session.total(&fx.catalog) - (9.99 * 7.0 + 1.50)).abs() < 1e-9);
    }

    #[test]
    fn cancel_leaves_the_ledger_untouched() {
        let fx = create_test_fixture();
        let before: Vec<String> = fx
            .ledger
            .list_resolved(&fx.catalog)
            .iter()
            .map(|r| r.id.to_string())
            .collect();

        let mut session = CheckoutSession::new();
        session.select_customer("c1", &fx.customers);
        session.add_item("p1", 4);
        session.cancel();

        assert_eq!(session.state(), CheckoutState::Canceled);
        assert_eq!(fx.ledger.len(), before.len());
        assert!(fx.ledger.is_empty());
    }

    #[test]
    fn finishing_an_empty_cart_records_a_zero_total() {
        let mut fx = create_test_fixture();
        let mut session = CheckoutSession::new();
        session.select_customer("", &fx.customers);

        let id = session
            .finish(&fx.catalog, &mut fx.ledger, &fx.clock)
            .unwrap();
        let receipt = fx.ledger.get(&id).unwrap();
        assert_eq!(receipt.total, 0.0);
        assert!(receipt.items.is_empty());
    }

    #[test]
    fn parse_quantity_requires_a_positive_integer() {
        assert_eq!(parse_quantity("3").unwrap(), 3);
        assert_eq!(parse_quantity(" 12 ").unwrap(), 12);
        assert_eq!(parse_quantity("0"), Err(PosError::InvalidQuantity));
        assert_eq!(parse_quantity("-1"), Err(PosError::InvalidQuantity));
        assert_eq!(parse_quantity("2.5"), Err(PosError::InvalidQuantity));
        assert_eq!(parse_quantity("abc"), Err(PosError::InvalidQuantity));
        assert_eq!(parse_quantity(""), Err(PosError::InvalidQuantity));
    }

    proptest! {
        /// For any sequence of (product, quantity) entries, the receipt
        /// total is the sum of price times quantity and each product's
        /// accumulated quantity is the sum of its entries.
        #[test]
        fn prop_total_and_accumulation_invariant(
            entries in prop::collection::vec((0usize..4, 1u32..50), 1..20)
        ) {
            let temp = TempDir::new().unwrap();
            let ctx = DataContext::for_testing(temp.path());
            let mut catalog = Catalog::load(&ctx);
            let prices = [9.99, 1.50, 0.0, 123.45];
            for (i, price) in prices.iter().enumerate() {
                catalog.add(&format!("p{i}"), &format!("Product {i}"), *price).unwrap();
            }
            let customers = CustomerDirectory::load(&ctx);
            let mut ledger = ReceiptLedger::load(&ctx);
            let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap());

            let mut session = CheckoutSession::new();
            session.select_customer("", &customers);

            let mut expected: BTreeMap<String, u32> = BTreeMap::new();
            for (index, quantity) in &entries {
                let id = format!("p{index}");
                session.add_item(&id, *quantity);
                *expected.entry(id).or_insert(0) += *quantity;
            }

            prop_assert_eq!(session.cart(), &expected);

            let expected_total: f64 = expected
                .iter()
                .map(|(id, qty)| {
                    let index: usize = id[1..].parse().unwrap();
                    prices[index] * f64::from(*qty)
                })
                .sum();

            let receipt_id = session.finish(&catalog, &mut ledger, &clock).unwrap();
            let receipt = ledger.get(&receipt_id).unwrap();
            prop_assert!((receipt.total - expected_total).abs() < 1e-9);
            prop_assert_eq!(&receipt.items, &expected);
        }
    }
}

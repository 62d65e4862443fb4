//! Application state and the interactive menu loop.
//!
//! `App` owns the three managers and a `Screen` state machine: the menu,
//! notice screens ("Press Enter to continue"), and prompt-driven flows
//! that advance one line of input per Enter. All state lives here and is
//! mutated only on the main thread between one blocking key read and the
//! next; manager failures come back as values and are rendered as notices.

use crate::catalog::{self, Catalog};
use crate::checkout::{self, CheckoutSession, CustomerStep};
use crate::clock::Clock;
use crate::commands::Command;
use crate::customers::CustomerDirectory;
use crate::error::PosError;
use crate::ledger::ReceiptLedger;
use crate::prompt::Prompt;
use crate::store::DataContext;
use crate::ui;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;
use std::io;

const CUSTOMER_PROMPT: &str =
    "Enter customer ID (or 'list' to view customers, or leave blank for guest): ";
const PRODUCT_PROMPT: &str = "Enter product ID (or 'done' to finish, 'cancel' to cancel): ";

/// Styling class for one line of notice/context output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Heading,
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoticeLine {
    pub kind: LineKind,
    pub text: String,
}

impl NoticeLine {
    pub fn heading(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Heading,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Success,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Warning,
            text: text.into(),
        }
    }
}

/// Stages of the Add Product flow.
#[derive(Debug)]
pub enum AddProductStage {
    Id,
    Name { id: String },
    Price { id: String, name: String },
}

/// Stages of the Update Product flow.
#[derive(Debug)]
pub enum UpdateProductStage {
    Id,
    Name { id: String },
    Price { id: String, new_name: Option<String> },
}

/// Stages of the Add Customer flow.
#[derive(Debug)]
pub enum AddCustomerStage {
    Id,
    Name { id: String },
}

/// Stages of the checkout flow's prompt loop.
#[derive(Debug)]
pub enum CheckoutStage {
    Customer,
    Product,
    Quantity { product_id: String },
}

/// A prompt-driven interaction in progress.
pub enum Flow {
    AddProduct(AddProductStage),
    UpdateProduct(UpdateProductStage),
    DeleteProduct,
    AddCustomer(AddCustomerStage),
    Checkout {
        session: CheckoutSession,
        stage: CheckoutStage,
    },
}

/// What the terminal is currently showing.
pub enum Screen {
    Menu,
    Notice {
        lines: Vec<NoticeLine>,
    },
    Prompt {
        flow: Flow,
        prompt: Prompt,
        context: Vec<NoticeLine>,
    },
}

impl Screen {
    pub fn notice(lines: Vec<NoticeLine>) -> Self {
        Screen::Notice { lines }
    }
}

fn prompt_screen(flow: Flow, label: &str, context: Vec<NoticeLine>) -> Screen {
    Screen::Prompt {
        flow,
        prompt: Prompt::new(label),
        context,
    }
}

pub struct App {
    pub catalog: Catalog,
    pub customers: CustomerDirectory,
    pub ledger: ReceiptLedger,
    pub screen: Screen,
    /// Menu cursor: index into [`Command::ALL`].
    pub selected: usize,
    clock: Box<dyn Clock>,
}

impl App {
    /// Load all three mappings from the data directory and start at the
    /// menu. Load failures have already been downgraded to empty mappings
    /// by the store.
    pub fn load(data: DataContext, clock: Box<dyn Clock>) -> Self {
        let catalog = Catalog::load(&data);
        let customers = CustomerDirectory::load(&data);
        let ledger = ReceiptLedger::load(&data);
        tracing::info!(
            products = catalog.len(),
            customers = customers.len(),
            receipts = ledger.len(),
            "state loaded"
        );
        Self {
            catalog,
            customers,
            ledger,
            screen: Screen::Menu,
            selected: 0,
            clock,
        }
    }

    /// The interactive loop: draw, block on a key, dispatch; repeat until
    /// Exit is selected.
    pub fn run(&mut self, mut terminal: DefaultTerminal) -> io::Result<()> {
        loop {
            terminal.draw(|frame| ui::render(frame, self))?;

            let event = event::read()?;
            if !self.handle_event(event) {
                break Ok(());
            }
        }
    }

    /// Returns false when the application should exit.
    pub fn handle_event(&mut self, event: Event) -> bool {
        if let Event::Key(key) = event {
            return self.handle_key_event(key);
        }
        true
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        match self.screen {
            Screen::Menu => self.handle_menu_key(key),
            Screen::Notice { .. } => self.handle_notice_key(key),
            Screen::Prompt { .. } => self.handle_prompt_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.selected = if self.selected == 0 {
                    Command::ALL.len() - 1
                } else {
                    self.selected - 1
                };
            }
            KeyCode::Down | KeyCode::Tab => {
                self.selected = (self.selected + 1) % Command::ALL.len();
            }
            KeyCode::Enter => return self.dispatch(),
            _ => {}
        }
        true
    }

    fn handle_notice_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Enter {
            self.screen = Screen::Menu;
        }
        true
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c)
                if key.modifiers == KeyModifiers::NONE
                    || key.modifiers == KeyModifiers::SHIFT =>
            {
                if let Screen::Prompt { prompt, .. } = &mut self.screen {
                    prompt.insert_char(c);
                }
            }
            KeyCode::Backspace => {
                if let Screen::Prompt { prompt, .. } = &mut self.screen {
                    prompt.backspace();
                }
            }
            KeyCode::Enter => {
                if let Screen::Prompt { flow, mut prompt, .. } =
                    std::mem::replace(&mut self.screen, Screen::Menu)
                {
                    let input = prompt.take();
                    self.screen = self.advance_flow(flow, input);
                }
            }
            _ => {}
        }
        true
    }

    /// Dispatch the command under the cursor. Returns false for Exit.
    fn dispatch(&mut self) -> bool {
        let command = Command::ALL[self.selected];
        tracing::debug!(command = command.label(), "dispatching menu command");
        match command {
            Command::ViewProducts => self.screen = Screen::notice(self.product_lines()),
            Command::AddProduct => {
                self.screen = prompt_screen(
                    Flow::AddProduct(AddProductStage::Id),
                    "Enter product ID: ",
                    Vec::new(),
                );
            }
            Command::UpdateProduct => {
                self.screen = prompt_screen(
                    Flow::UpdateProduct(UpdateProductStage::Id),
                    "Enter product ID to update: ",
                    Vec::new(),
                );
            }
            Command::DeleteProduct => {
                self.screen = prompt_screen(
                    Flow::DeleteProduct,
                    "Enter product ID to delete: ",
                    Vec::new(),
                );
            }
            Command::Checkout => {
                self.screen = prompt_screen(
                    Flow::Checkout {
                        session: CheckoutSession::new(),
                        stage: CheckoutStage::Customer,
                    },
                    CUSTOMER_PROMPT,
                    Vec::new(),
                );
            }
            Command::AddCustomer => {
                self.screen = prompt_screen(
                    Flow::AddCustomer(AddCustomerStage::Id),
                    "Enter customer ID: ",
                    Vec::new(),
                );
            }
            Command::ViewCustomers => self.screen = Screen::notice(self.customer_lines()),
            Command::ViewReceipts => self.screen = Screen::notice(self.receipt_lines()),
            Command::ClearReceipts => {
                self.screen = Screen::notice(match self.ledger.clear_all() {
                    Ok(()) => vec![NoticeLine::success("Receipts cleared successfully.")],
                    Err(err) => vec![NoticeLine::warning(format!("An error occurred: {err}"))],
                });
            }
            Command::Exit => {
                tracing::info!("exit selected");
                return false;
            }
        }
        true
    }

    fn advance_flow(&mut self, flow: Flow, input: String) -> Screen {
        match flow {
            Flow::AddProduct(stage) => self.advance_add_product(stage, input),
            Flow::UpdateProduct(stage) => self.advance_update_product(stage, input),
            Flow::DeleteProduct => self.advance_delete_product(input),
            Flow::AddCustomer(stage) => self.advance_add_customer(stage, input),
            Flow::Checkout { session, stage } => self.advance_checkout(session, stage, input),
        }
    }

    fn advance_add_product(&mut self, stage: AddProductStage, input: String) -> Screen {
        match stage {
            AddProductStage::Id => {
                let id = input.trim().to_string();
                if id.is_empty() {
                    return Screen::notice(Vec::new());
                }
                if self.catalog.resolve(&id).is_some() {
                    return Screen::notice(vec![NoticeLine::warning(
                        "Product ID already exists.",
                    )]);
                }
                prompt_screen(
                    Flow::AddProduct(AddProductStage::Name { id }),
                    "Enter product name: ",
                    Vec::new(),
                )
            }
            AddProductStage::Name { id } => {
                let name = input.trim().to_string();
                prompt_screen(
                    Flow::AddProduct(AddProductStage::Price { id, name }),
                    "Enter product price: ",
                    Vec::new(),
                )
            }
            AddProductStage::Price { id, name } => match catalog::parse_price(&input) {
                Ok(price) => match self.catalog.add(&id, &name, price) {
                    Ok(()) => Screen::notice(vec![NoticeLine::success(format!(
                        "Product '{name}' added successfully."
                    ))]),
                    Err(PosError::DuplicateId(_)) => {
                        Screen::notice(vec![NoticeLine::warning("Product ID already exists.")])
                    }
                    Err(err) => {
                        Screen::notice(vec![NoticeLine::warning(format!(
                            "An error occurred: {err}"
                        ))])
                    }
                },
                Err(_) => Screen::notice(vec![NoticeLine::warning("Invalid price input.")]),
            },
        }
    }

    fn advance_update_product(&mut self, stage: UpdateProductStage, input: String) -> Screen {
        match stage {
            UpdateProductStage::Id => {
                let id = input.trim().to_string();
                if id.is_empty() {
                    return Screen::notice(Vec::new());
                }
                match self.catalog.resolve(&id) {
                    None => Screen::notice(vec![NoticeLine::warning("Product ID not found.")]),
                    Some(product) => {
                        let label = format!(
                            "Enter new name for '{}' (or press Enter to keep): ",
                            product.name
                        );
                        prompt_screen(
                            Flow::UpdateProduct(UpdateProductStage::Name { id }),
                            &label,
                            Vec::new(),
                        )
                    }
                }
            }
            UpdateProductStage::Name { id } => {
                let entered = input.trim().to_string();
                let new_name = (!entered.is_empty()).then_some(entered);
                let display = new_name.clone().unwrap_or_else(|| {
                    self.catalog
                        .resolve(&id)
                        .map(|p| p.name.clone())
                        .unwrap_or_default()
                });
                let label =
                    format!("Enter new price for '{display}' (or press Enter to keep): ");
                prompt_screen(
                    Flow::UpdateProduct(UpdateProductStage::Price { id, new_name }),
                    &label,
                    Vec::new(),
                )
            }
            UpdateProductStage::Price { id, new_name } => {
                let name_ref = new_name.as_deref();
                let raw = input.trim();
                let result = if raw.is_empty() {
                    self.catalog.update(&id, name_ref, None)
                } else {
                    match catalog::parse_price(raw) {
                        Ok(price) => self.catalog.update(&id, name_ref, Some(price)),
                        // Keep the name edit, then report the bad price.
                        Err(err) => self.catalog.update(&id, name_ref, None).and(Err(err)),
                    }
                };
                match result {
                    Ok(()) => Screen::notice(vec![NoticeLine::success(format!(
                        "Product '{id}' updated successfully."
                    ))]),
                    Err(PosError::InvalidPrice) => {
                        Screen::notice(vec![NoticeLine::warning("Invalid price input.")])
                    }
                    Err(PosError::NotFound(_)) => {
                        Screen::notice(vec![NoticeLine::warning("Product ID not found.")])
                    }
                    Err(err) => Screen::notice(vec![NoticeLine::warning(format!(
                        "An error occurred: {err}"
                    ))]),
                }
            }
        }
    }

    fn advance_delete_product(&mut self, input: String) -> Screen {
        let id = input.trim().to_string();
        if id.is_empty() {
            return Screen::notice(Vec::new());
        }
        match self.catalog.delete(&id) {
            Ok(()) => Screen::notice(vec![NoticeLine::success(format!(
                "Product '{id}' deleted successfully."
            ))]),
            Err(PosError::NotFound(_)) => {
                Screen::notice(vec![NoticeLine::warning("Product ID not found.")])
            }
            Err(err) => {
                Screen::notice(vec![NoticeLine::warning(format!("An error occurred: {err}"))])
            }
        }
    }

    fn advance_add_customer(&mut self, stage: AddCustomerStage, input: String) -> Screen {
        match stage {
            AddCustomerStage::Id => {
                let id = input.trim().to_string();
                if id.is_empty() {
                    return Screen::notice(vec![NoticeLine::warning("Customer ID is required.")]);
                }
                if self.customers.resolve(&id).is_some() {
                    return Screen::notice(vec![NoticeLine::warning(
                        "Customer ID already exists.",
                    )]);
                }
                prompt_screen(
                    Flow::AddCustomer(AddCustomerStage::Name { id }),
                    "Enter customer name: ",
                    Vec::new(),
                )
            }
            AddCustomerStage::Name { id } => {
                let name = input.trim().to_string();
                match self.customers.add(&id, &name) {
                    Ok(()) => Screen::notice(vec![NoticeLine::success(format!(
                        "Customer '{name}' added successfully."
                    ))]),
                    Err(PosError::DuplicateId(_)) => {
                        Screen::notice(vec![NoticeLine::warning("Customer ID already exists.")])
                    }
                    Err(err) => Screen::notice(vec![NoticeLine::warning(format!(
                        "An error occurred: {err}"
                    ))]),
                }
            }
        }
    }

    fn advance_checkout(
        &mut self,
        mut session: CheckoutSession,
        stage: CheckoutStage,
        input: String,
    ) -> Screen {
        match stage {
            CheckoutStage::Customer => match session.select_customer(&input, &self.customers) {
                CustomerStep::ListRequested => {
                    let context = self.customer_lines();
                    prompt_screen(
                        Flow::Checkout {
                            session,
                            stage: CheckoutStage::Customer,
                        },
                        CUSTOMER_PROMPT,
                        context,
                    )
                }
                CustomerStep::NotFound => prompt_screen(
                    Flow::Checkout {
                        session,
                        stage: CheckoutStage::Customer,
                    },
                    CUSTOMER_PROMPT,
                    vec![NoticeLine::warning("Customer ID not found.")],
                ),
                CustomerStep::Resolved => {
                    let context = self.product_lines();
                    prompt_screen(
                        Flow::Checkout {
                            session,
                            stage: CheckoutStage::Product,
                        },
                        PRODUCT_PROMPT,
                        context,
                    )
                }
            },
            CheckoutStage::Product => {
                let token = input.trim().to_string();
                if token.eq_ignore_ascii_case("done") {
                    return self.finalize_checkout(session);
                }
                if token.eq_ignore_ascii_case("cancel") {
                    session.cancel();
                    return Screen::notice(vec![NoticeLine::warning("Checkout canceled.")]);
                }
                match self.catalog.resolve(&token) {
                    Some(product) => {
                        let label = format!("Enter quantity for '{}': ", product.name);
                        prompt_screen(
                            Flow::Checkout {
                                session,
                                stage: CheckoutStage::Quantity { product_id: token },
                            },
                            &label,
                            Vec::new(),
                        )
                    }
                    None => {
                        let mut context = self.product_lines();
                        context.push(NoticeLine::warning("Product ID not found."));
                        prompt_screen(
                            Flow::Checkout {
                                session,
                                stage: CheckoutStage::Product,
                            },
                            PRODUCT_PROMPT,
                            context,
                        )
                    }
                }
            }
            CheckoutStage::Quantity { product_id } => {
                let mut context = self.product_lines();
                match checkout::parse_quantity(&input) {
                    Ok(quantity) => session.add_item(&product_id, quantity),
                    Err(_) => context.push(NoticeLine::warning("Invalid quantity input.")),
                }
                prompt_screen(
                    Flow::Checkout {
                        session,
                        stage: CheckoutStage::Product,
                    },
                    PRODUCT_PROMPT,
                    context,
                )
            }
        }
    }

    fn finalize_checkout(&mut self, mut session: CheckoutSession) -> Screen {
        let mut lines = vec![NoticeLine::heading("--- Receipt ---")];
        for (id, quantity) in session.cart() {
            if let Some(product) = self.catalog.resolve(id) {
                let subtotal = product.price * f64::from(*quantity);
                lines.push(NoticeLine::info(format!(
                    "{} x{quantity} = ${subtotal:.2}",
                    product.name
                )));
            }
        }

        let total = session.total(&self.catalog);
        match session.finish(&self.catalog, &mut self.ledger, self.clock.as_ref()) {
            Ok(_receipt_id) => lines.push(NoticeLine::success(format!("Total: ${total:.2}"))),
            Err(err) => {
                lines.push(NoticeLine::success(format!("Total: ${total:.2}")));
                lines.push(NoticeLine::warning(format!("An error occurred: {err}")));
            }
        }
        Screen::notice(lines)
    }

    pub fn product_lines(&self) -> Vec<NoticeLine> {
        let mut lines = vec![NoticeLine::heading("--- Product List ---")];
        if self.catalog.is_empty() {
            lines.push(NoticeLine::warning("No products available."));
            return lines;
        }
        for (id, product) in self.catalog.list() {
            lines.push(NoticeLine::info(format!(
                "ID: {id}, Name: {}, Price: ${:.2}",
                product.name, product.price
            )));
        }
        lines
    }

    pub fn customer_lines(&self) -> Vec<NoticeLine> {
        let mut lines = vec![NoticeLine::heading("--- Customer List ---")];
        if self.customers.is_empty() {
            lines.push(NoticeLine::warning("No customers available."));
            return lines;
        }
        for (id, customer) in self.customers.list() {
            lines.push(NoticeLine::info(format!("ID: {id}, Name: {}", customer.name)));
        }
        lines
    }

    pub fn receipt_lines(&self) -> Vec<NoticeLine> {
        let mut lines = vec![NoticeLine::heading("--- Receipt List ---")];
        let resolved = self.ledger.list_resolved(&self.catalog);
        if resolved.is_empty() {
            lines.push(NoticeLine::warning("No receipts available."));
            return lines;
        }
        for entry in resolved {
            lines.push(NoticeLine::heading(format!("Receipt ID: {}", entry.id)));
            lines.push(NoticeLine::info(format!(
                "Customer: {} (ID: {})",
                entry.receipt.customer_name, entry.receipt.customer_id
            )));
            for line in &entry.lines {
                match line.name {
                    Some(name) => {
                        lines.push(NoticeLine::info(format!("  {name} x{}", line.quantity)));
                    }
                    None => lines.push(NoticeLine::warning(format!(
                        "  [missing product {}] x{}",
                        line.product_id, line.quantity
                    ))),
                }
            }
            lines.push(NoticeLine::info(format!("  Total: ${:.2}", entry.receipt.total)));
            lines.push(NoticeLine::info(format!(
                "  Timestamp: {}",
                entry.receipt.timestamp.format("%Y-%m-%d %H:%M:%S")
            )));
        }
        lines
    }
}

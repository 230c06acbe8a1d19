//! # pasal-core: Pure Business Logic for Pasal POS
//!
//! Everything a shop counter needs to compute a bill, as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pasal POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Front ends (web POS, pasal-cli)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ pasal-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │  pricing  │  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │ compute_  │  │   │
//! │  │   │  Discount │  │ VAT math  │  │ LineItem  │  │  totals   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    pasal-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Discount, Sale, KhataEntry, ...)
//! - [`money`] - Money in paisa with integer VAT arithmetic
//! - [`cart`] - Cart and its mutations
//! - [`pricing`] - The pricing engine
//! - [`error`] - Domain error types
//! - [`validation`] - Sanitisers and validators
//!
//! ## Example Usage
//!
//! ```rust
//! use pasal_core::{compute_totals, Cart, Discount, LineItem, Money, NEPAL_VAT_RATE};
//!
//! let mut cart = Cart::new();
//! cart.push_line(LineItem::new("p1", "DAHI-500", "Dahi 500g", Money::from_rupees(113), 1));
//!
//! let totals = compute_totals(&cart, NEPAL_VAT_RATE);
//! assert_eq!(totals.grand_total, Money::from_rupees(113));
//! assert_eq!(totals.tax_amount, Money::from_rupees(13));
//! ```

pub mod cart;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

pub use cart::{Cart, LineItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{compute_totals, LineTotals, PricingEngine, PricingResult, NEPAL_VAT_RATE};
pub use types::*;

/// Maximum lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 on the stepper.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a line may carry, in paisa (Rs. 1,00,00,000).
///
/// Keeps `price × quantity` summed over a full cart well inside `i64`.
pub const MAX_UNIT_PRICE_PAISA: i64 = 1_000_000_000;

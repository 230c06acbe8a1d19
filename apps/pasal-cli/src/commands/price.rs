//! `pasal price` - price a cart file and print the bill.
//!
//! ## Cart Files
//! Two shapes are accepted:
//!
//! ```json
//! { "items": [ { "sku": "WAIWAI-75", "quantity": 2 },
//!              { "sku": "MOMO-HALF", "discount": { "kind": "percentage", "value": 1000 } } ],
//!   "discount": { "kind": "fixed", "value": 2000 } }
//! ```
//! resolved against the catalogue (product or variant SKU, or barcode), or a
//! fully priced cart as the web POS holds it (`productId`, `unitPrice`, ...),
//! which is priced as-is after sanitising quantities and discounts. Unit
//! prices in a priced cart must lie within the catalogue price range.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::debug;

use super::{money, print_json};
use crate::config::PasalConfig;
use crate::error::{CliError, CliResult};
use pasal_core::validation::{validate_price, validate_quantity};
use pasal_core::{Cart, CoreError, Discount, LineItem, Money, PricingEngine, PricingResult};
use pasal_db::Database;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CartSource {
    /// Lines already carry prices.
    Priced(Cart),
    /// Lines name catalogue codes.
    Catalogue(CartFile),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFile {
    pub items: Vec<CartFileLine>,
    #[serde(default)]
    pub discount: Discount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFileLine {
    pub sku: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub discount: Discount,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceOutput<'a> {
    items: &'a [LineItem],
    discount: Discount,
    vat_rate_bps: u32,
    totals: &'a PricingResult,
}

/// Execute the `price` command.
pub async fn execute(config: &PasalConfig, db: &Database, path: &Path, json: bool) -> CliResult<()> {
    let cart = cart_from_source(db, read_cart_source(path)?).await?;

    let totals = PricingEngine::new(config.vat_rate).compute(&cart);

    if json {
        return print_json(&PriceOutput {
            items: &cart.items,
            discount: cart.discount,
            vat_rate_bps: config.vat_rate.bps(),
            totals: &totals,
        });
    }

    print!("{}", render_bill(config, &cart, &totals));
    Ok(())
}

pub fn read_cart_source(path: &Path) -> CliResult<CartSource> {
    let raw = std::fs::read_to_string(path)?;
    let source: CartSource = serde_json::from_str(&raw)?;
    Ok(source)
}

/// Turns any cart source into a cart, resolving codes against `db`.
pub async fn cart_from_source(db: &Database, source: CartSource) -> CliResult<Cart> {
    match source {
        CartSource::Priced(mut cart) => {
            for line in &cart.items {
                validate_price(line.unit_price).map_err(CoreError::from)?;
            }
            cart.sanitize();
            Ok(cart)
        }
        CartSource::Catalogue(file) => build_cart(db, &file).await,
    }
}

/// Builds a cart from catalogue codes through the same `add_item` path the
/// till uses: repeated codes merge, stock and activity are checked.
pub async fn build_cart(db: &Database, file: &CartFile) -> CliResult<Cart> {
    let products = db.products();
    let mut cart = Cart::new();

    for line in &file.items {
        validate_quantity(line.quantity).map_err(CoreError::from)?;

        let (product, variant) = products
            .resolve_sku(&line.sku)
            .await?
            .ok_or_else(|| CliError::not_found("Product", &line.sku))?;

        let index = cart.add_item(&product, variant.as_ref(), line.quantity)?;
        if !line.discount.is_none() {
            cart.set_item_discount(index, line.discount)?;
        }
    }

    cart.set_cart_discount(file.discount);

    debug!(lines = cart.item_count(), quantity = cart.total_quantity(), "Cart built");
    Ok(cart)
}

/// Plain-text bill for the terminal.
pub fn render_bill(config: &PasalConfig, cart: &Cart, totals: &PricingResult) -> String {
    Bill {
        config,
        cart,
        totals,
    }
    .to_string()
}

struct Bill<'a> {
    config: &'a PasalConfig,
    cart: &'a Cart,
    totals: &'a PricingResult,
}

impl Bill<'_> {
    fn row(&self, f: &mut fmt::Formatter<'_>, label: &str, amount: Money) -> fmt::Result {
        writeln!(f, "{:<34}{:>14}", label, money(self.config, amount))
    }
}

impl fmt::Display for Bill<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Bill {
            config,
            cart,
            totals,
        } = *self;
        let rule = "-".repeat(48);

        writeln!(f, "{:>4}  {:<28}{:>14}", "Qty", "Item", "Amount")?;
        writeln!(f, "{rule}")?;

        for (item, line) in cart.items.iter().zip(&totals.lines) {
            writeln!(
                f,
                "{:>4}  {:<28}{:>14}",
                item.quantity,
                truncate(&item.name, 27),
                money(config, line.line_subtotal)
            )?;
            write!(f, "      @ {}", money(config, item.unit_price))?;
            if !line.discount.is_zero() {
                write!(f, ", less {}", money(config, line.discount))?;
            }
            writeln!(f)?;
        }

        writeln!(f, "{rule}")?;
        self.row(f, "Subtotal", totals.subtotal)?;
        if !totals.item_discount_total.is_zero() {
            self.row(f, "Item discounts", -totals.item_discount_total)?;
        }
        if !totals.cart_discount_total.is_zero() {
            self.row(f, "Bill discount", -totals.cart_discount_total)?;
        }
        self.row(f, "Total", totals.grand_total)?;
        self.row(
            f,
            &format!("  incl. VAT {}%", config.vat_rate.percentage()),
            totals.tax_amount,
        )
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

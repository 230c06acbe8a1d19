//! # Cart
//!
//! The shopping cart owned by one checkout session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cashier Action           Cart Method              Cart State Change    │
//! │  ──────────────           ───────────              ─────────────────    │
//! │  Tap product ───────────► add_item() ────────────► push or merge line   │
//! │  Quantity stepper ──────► set_quantity() ────────► items[i].quantity    │
//! │  Line discount ─────────► set_item_discount() ───► items[i].discount    │
//! │  Bill discount ─────────► set_cart_discount() ───► discount             │
//! │  Pick size/plate ───────► switch_variant() ──────► swap price / merge   │
//! │  Remove ────────────────► remove_item() ─────────► items.remove(i)      │
//! │                                                                         │
//! │  After every change the caller re-prices with totals().                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Insertion order is display order
//! - One line per (product, variant) pair: adding again merges quantities
//! - `1 <= quantity <= MAX_ITEM_QUANTITY`
//! - `0 <= unit_price <= MAX_UNIT_PRICE_PAISA` for lines taken from outside
//! - Discounts are sanitised on the way in (non-negative, at most 100%)

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{compute_totals, PricingResult, NEPAL_VAT_RATE};
use crate::types::{Discount, Product, ProductVariant, TaxRate};
use crate::validation::{
    sanitize_discount, sanitize_quantity, sanitize_unit_price, validate_cart_size,
};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
///
/// ## Price Freezing
/// Price, name and SKU are copied from the product when the line is
/// created. Later price edits in the catalogue do not affect an open cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,

    #[serde(default)]
    pub variant_id: Option<String>,

    pub sku: String,

    pub name: String,

    /// Tax-inclusive unit price.
    pub unit_price: Money,

    pub quantity: i64,

    /// VAT rate of the product. Informational: the bill reverses the flat
    /// engine rate out of the net amount.
    #[serde(default = "default_tax_rate")]
    pub tax_rate: TaxRate,

    #[serde(default)]
    pub discount: Discount,
}

fn default_tax_rate() -> TaxRate {
    NEPAL_VAT_RATE
}

impl LineItem {
    /// Creates a line with no discount at the standard VAT rate.
    pub fn new(product_id: &str, sku: &str, name: &str, unit_price: Money, quantity: i64) -> Self {
        LineItem {
            product_id: product_id.to_string(),
            variant_id: None,
            sku: sku.to_string(),
            name: name.to_string(),
            unit_price,
            quantity: sanitize_quantity(quantity),
            tax_rate: NEPAL_VAT_RATE,
            discount: Discount::None,
        }
    }

    /// Creates a line from a catalogue product, optionally one of its variants.
    pub fn from_product(product: &Product, variant: Option<&ProductVariant>, quantity: i64) -> Self {
        let mut line = LineItem::new(&product.id, &product.sku, &product.name, product.price(), quantity);
        line.tax_rate = product.tax_rate();
        if let Some(variant) = variant {
            line.apply_variant(product, variant);
        }
        line
    }

    /// unit price × quantity.
    pub fn line_subtotal(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    fn key_matches(&self, product_id: &str, variant_id: Option<&str>) -> bool {
        self.product_id == product_id && self.variant_id.as_deref() == variant_id
    }

    fn apply_variant(&mut self, product: &Product, variant: &ProductVariant) {
        self.variant_id = Some(variant.id.clone());
        self.sku = variant.sku.clone();
        self.name = format!("{} ({})", product.name, variant.name);
        self.unit_price = variant.price();
    }

    fn apply_base_product(&mut self, product: &Product) {
        self.variant_id = None;
        self.sku = product.sku.clone();
        self.name = product.name.clone();
        self.unit_price = product.price();
    }
}

/// The shopping cart: ordered lines plus one bill-level discount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<LineItem>,

    /// Applied once, after item discounts.
    #[serde(default)]
    pub discount: Discount,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a product (or one of its variants) to the cart.
    ///
    /// ## Behavior
    /// - Same product and variant already in cart: quantity increases
    /// - Otherwise: a new line is appended with the price frozen
    ///
    /// ## Returns
    /// Index of the line that now holds the product.
    pub fn add_item(
        &mut self,
        product: &Product,
        variant: Option<&ProductVariant>,
        quantity: i64,
    ) -> CoreResult<usize> {
        if !product.is_active {
            return Err(CoreError::ProductInactive {
                sku: product.sku.clone(),
            });
        }
        if let Some(variant) = variant {
            check_variant(product, variant)?;
        }

        let quantity = quantity.max(1);
        let variant_id = variant.map(|v| v.id.as_str());

        if let Some(index) = self.find_line(&product.id, variant_id) {
            let new_qty = self.items[index].quantity + quantity;
            check_quantity(new_qty)?;
            check_stock(product, new_qty)?;
            self.items[index].quantity = new_qty;
            return Ok(index);
        }

        validate_cart_size(self.items.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;
        check_quantity(quantity)?;
        check_stock(product, quantity)?;

        self.items.push(LineItem::from_product(product, variant, quantity));
        Ok(self.items.len() - 1)
    }

    /// Appends a prepared line as-is (after sanitising it).
    ///
    /// Does not merge with existing lines; use [`Cart::add_item`] for
    /// catalogue products.
    pub fn push_line(&mut self, mut line: LineItem) {
        line.unit_price = sanitize_unit_price(line.unit_price);
        line.quantity = sanitize_quantity(line.quantity);
        line.discount = sanitize_discount(line.discount);
        self.items.push(line);
    }

    /// Sets a line's quantity, clamped to `1..=MAX_ITEM_QUANTITY`.
    pub fn set_quantity(&mut self, index: usize, quantity: i64) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        line.quantity = sanitize_quantity(quantity);
        Ok(())
    }

    /// Quantity stepper "+".
    pub fn increment(&mut self, index: usize) -> CoreResult<()> {
        let current = self.line(index)?.quantity;
        self.set_quantity(index, current + 1)
    }

    /// Quantity stepper "−". Never drops below one; removal is explicit.
    pub fn decrement(&mut self, index: usize) -> CoreResult<()> {
        let current = self.line(index)?.quantity;
        self.set_quantity(index, current - 1)
    }

    pub fn set_item_discount(&mut self, index: usize, discount: Discount) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        line.discount = sanitize_discount(discount);
        Ok(())
    }

    pub fn set_cart_discount(&mut self, discount: Discount) {
        self.discount = sanitize_discount(discount);
    }

    /// Switches the line at `index` to another variant of the same product
    /// (`None` switches back to the base product).
    ///
    /// Quantity and line discount are kept. If the cart already holds a line
    /// for the target variant, the two lines merge into that one.
    ///
    /// ## Returns
    /// Index of the line that now holds the variant.
    pub fn switch_variant(
        &mut self,
        index: usize,
        product: &Product,
        variant: Option<&ProductVariant>,
    ) -> CoreResult<usize> {
        let line = self.line(index)?;
        if line.product_id != product.id {
            return Err(CoreError::ProductNotFound(line.product_id.clone()));
        }
        if let Some(variant) = variant {
            check_variant(product, variant)?;
        }

        let variant_id = variant.map(|v| v.id.as_str());
        if line.variant_id.as_deref() == variant_id {
            return Ok(index);
        }

        let existing = self
            .items
            .iter()
            .enumerate()
            .find(|(i, l)| *i != index && l.key_matches(&product.id, variant_id))
            .map(|(i, _)| i);

        match existing {
            Some(target) => {
                let moved = self.items.remove(index);
                let target = if target > index { target - 1 } else { target };
                let merged = &mut self.items[target];
                merged.quantity = (merged.quantity + moved.quantity).min(MAX_ITEM_QUANTITY);
                Ok(target)
            }
            None => {
                let line = &mut self.items[index];
                match variant {
                    Some(variant) => line.apply_variant(product, variant),
                    None => line.apply_base_product(product),
                }
                Ok(index)
            }
        }
    }

    /// Removes and returns the line at `index`.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<LineItem> {
        self.line(index)?;
        Ok(self.items.remove(index))
    }

    /// Empties the cart and drops the bill discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount = Discount::None;
    }

    /// Applies the cashier-input sanitisers to every line and the bill
    /// discount. Used on carts that arrive from outside (JSON files).
    pub fn sanitize(&mut self) {
        for line in &mut self.items {
            line.unit_price = sanitize_unit_price(line.unit_price);
            line.quantity = sanitize_quantity(line.quantity);
            line.discount = sanitize_discount(line.discount);
        }
        self.discount = sanitize_discount(self.discount);
    }

    /// Prices the cart.
    pub fn totals(&self, vat_rate: TaxRate) -> PricingResult {
        compute_totals(self, vat_rate)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find_line(&self, product_id: &str, variant_id: Option<&str>) -> Option<usize> {
        self.items
            .iter()
            .position(|l| l.key_matches(product_id, variant_id))
    }

    fn line(&self, index: usize) -> CoreResult<&LineItem> {
        self.items.get(index).ok_or(CoreError::LineNotFound { index })
    }

    fn line_mut(&mut self, index: usize) -> CoreResult<&mut LineItem> {
        self.items
            .get_mut(index)
            .ok_or(CoreError::LineNotFound { index })
    }
}

fn check_variant(product: &Product, variant: &ProductVariant) -> CoreResult<()> {
    if variant.product_id != product.id {
        return Err(CoreError::VariantMismatch {
            variant_id: variant.id.clone(),
            product_id: product.id.clone(),
        });
    }
    Ok(())
}

fn check_quantity(quantity: i64) -> CoreResult<()> {
    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

fn check_stock(product: &Product, quantity: i64) -> CoreResult<()> {
    if !product.can_sell(quantity) {
        return Err(CoreError::InsufficientStock {
            sku: product.sku.clone(),
            available: product.current_stock,
            requested: quantity,
        });
    }
    Ok(())
}

//! # Pricing Engine
//!
//! Computes the bill for a cart under VAT-inclusive pricing.
//!
//! ## Order of Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For every line:                                                        │
//! │    line_subtotal = unit_price × quantity                                │
//! │    line_discount = item discount on line_subtotal (≤ line_subtotal)     │
//! │                                                                         │
//! │  subtotal            = Σ line_subtotal                                  │
//! │  item_discount_total = Σ line_discount                                  │
//! │  after_items         = subtotal − item_discount_total                   │
//! │  cart_discount_total = cart discount on after_items (≤ after_items)     │
//! │  net_amount          = after_items − cart_discount_total   (≥ 0)        │
//! │  tax_amount          = net_amount − net_amount / (1 + R)                │
//! │  grand_total         = net_amount      (tax already inside the price)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is always reversed out of the final net amount, after both discount
//! levels. Every path that records a sale uses this same function, so the
//! bill on screen and the stored sale agree.
//!
//! ## Rounding
//! All values are integer paisa. Percentage discounts and the VAT reversal
//! round half-up to the paisa; nothing else rounds. Because discounts are
//! capped rather than the result clamped,
//! `subtotal − item_discount_total − cart_discount_total == grand_total`
//! holds exactly.
//!
//! ## Example
//! ```rust
//! use pasal_core::cart::{Cart, LineItem};
//! use pasal_core::pricing::{compute_totals, NEPAL_VAT_RATE};
//! use pasal_core::{Discount, Money};
//!
//! let mut cart = Cart::new();
//! cart.push_line(LineItem::new("momo", "MOMO-BUFF", "Buff Momo", Money::from_rupees(100), 2));
//! cart.set_cart_discount(Discount::percent(10));
//!
//! let totals = compute_totals(&cart, NEPAL_VAT_RATE);
//! assert_eq!(totals.subtotal, Money::from_rupees(200));
//! assert_eq!(totals.cart_discount_total, Money::from_rupees(20));
//! assert_eq!(totals.grand_total, Money::from_rupees(180));
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::money::Money;
use crate::types::TaxRate;

/// Nepal's flat VAT rate, 13%.
pub const NEPAL_VAT_RATE: TaxRate = TaxRate::from_bps(1300);

/// Per-line breakdown, in cart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineTotals {
    pub line_subtotal: Money,
    pub discount: Money,
    /// `line_subtotal − discount`, before the cart discount.
    pub net: Money,
}

/// The computed bill. Derived from a cart; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub subtotal: Money,
    pub item_discount_total: Money,
    pub cart_discount_total: Money,
    pub net_amount: Money,
    /// VAT contained in `grand_total`. Informational, not added on top.
    pub tax_amount: Money,
    pub grand_total: Money,
    pub lines: Vec<LineTotals>,
}

impl PricingResult {
    /// Both discount levels together.
    pub fn discount_total(&self) -> Money {
        self.item_discount_total + self.cart_discount_total
    }

    /// Net amount with the VAT taken out.
    pub fn taxable_amount(&self) -> Money {
        self.net_amount - self.tax_amount
    }

    /// Change owed for a cash tender, `None` if the tender is short.
    pub fn change_for(&self, tendered: Money) -> Option<Money> {
        if tendered < self.grand_total {
            None
        } else {
            Some(tendered - self.grand_total)
        }
    }
}

/// Prices `cart`, reversing VAT at `vat_rate` out of the net amount.
///
/// Pure and total: quantities and discounts are expected to be sanitised by
/// the caller (see [`crate::validation`]), and anything out of range is
/// still handled by capping each discount at the amount it applies to.
pub fn compute_totals(cart: &Cart, vat_rate: TaxRate) -> PricingResult {
    let lines: Vec<LineTotals> = cart
        .items
        .iter()
        .map(|item| {
            let line_subtotal = item.line_subtotal();
            let discount = item.discount.amount_off(line_subtotal);
            LineTotals {
                line_subtotal,
                discount,
                net: line_subtotal - discount,
            }
        })
        .collect();

    let subtotal: Money = lines.iter().map(|l| l.line_subtotal).sum();
    let item_discount_total: Money = lines.iter().map(|l| l.discount).sum();
    let after_items = subtotal - item_discount_total;

    let cart_discount_total = cart.discount.amount_off(after_items);
    let net_amount = (after_items - cart_discount_total).non_negative();
    let tax_amount = net_amount.extract_inclusive_tax(vat_rate);

    PricingResult {
        subtotal,
        item_discount_total,
        cart_discount_total,
        net_amount,
        tax_amount,
        grand_total: net_amount,
        lines,
    }
}

/// A pricing engine bound to one VAT rate.
///
/// ```rust
/// use pasal_core::cart::Cart;
/// use pasal_core::pricing::PricingEngine;
///
/// let engine = PricingEngine::default(); // 13%
/// assert!(engine.compute(&Cart::new()).grand_total.is_zero());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingEngine {
    vat_rate: TaxRate,
}

impl PricingEngine {
    pub const fn new(vat_rate: TaxRate) -> Self {
        PricingEngine { vat_rate }
    }

    pub const fn vat_rate(&self) -> TaxRate {
        self.vat_rate
    }

    pub fn compute(&self, cart: &Cart) -> PricingResult {
        compute_totals(cart, self.vat_rate)
    }
}

impl Default for PricingEngine {
    fn default() -> Self {
        PricingEngine::new(NEPAL_VAT_RATE)
    }
}

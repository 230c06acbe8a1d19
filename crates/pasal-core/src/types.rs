//! # Domain Types
//!
//! Core domain types used throughout Pasal POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  sku (business) │   │  receipt_number │   │  method         │       │
//! │  │  price_paisa    │   │  total_paisa    │   │  amount_paisa   │       │
//! │  │  └ variants     │   │  └ SaleItem[]   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                             │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Discount     │   │    Customer     │   │   KhataEntry    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  None           │   │  id (UUID)      │   │  Credit         │       │
//! │  │  Percentage(bps)│   │  name, phone    │   │  Repayment      │       │
//! │  │  Fixed(Money)   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, receipt_number, phone) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1300 bps = 13% (Nepal VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from whole percent.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        TaxRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A discount applied to a single line or to the whole cart.
///
/// ## Wire Format
/// ```json
/// { "kind": "percentage", "value": 1000 }   // 10% (basis points)
/// { "kind": "fixed", "value": 5000 }        // Rs. 50 (paisa)
/// { "kind": "none" }
/// ```
///
/// A fixed discount is applied once to whatever it is attached to; it is
/// never scaled by quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Discount {
    #[default]
    None,
    /// Percentage in basis points (1000 = 10%).
    Percentage(u32),
    /// Flat amount off.
    Fixed(Money),
}

impl Discount {
    /// Percentage discount from whole percent.
    pub const fn percent(pct: u32) -> Self {
        Discount::Percentage(pct * 100)
    }

    /// Fixed discount from whole rupees.
    pub const fn rupees(rupees: i64) -> Self {
        Discount::Fixed(Money::from_rupees(rupees))
    }

    /// Returns the amount this discount takes off `base`, capped at `base`.
    ///
    /// ```rust
    /// use pasal_core::{Discount, Money};
    ///
    /// let base = Money::from_rupees(100);
    /// assert_eq!(Discount::percent(10).amount_off(base), Money::from_rupees(10));
    /// assert_eq!(Discount::rupees(500).amount_off(base), base);
    /// ```
    pub fn amount_off(&self, base: Money) -> Money {
        let base = base.non_negative();
        let raw = match *self {
            Discount::None => Money::zero(),
            Discount::Percentage(bps) => base.percentage(bps),
            Discount::Fixed(amount) => amount,
        };
        raw.non_negative().min(base)
    }

    pub fn is_none(&self) -> bool {
        match *self {
            Discount::None => true,
            Discount::Percentage(bps) => bps == 0,
            Discount::Fixed(amount) => amount.is_zero(),
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale. Prices are VAT-inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub barcode: Option<String>,

    /// Display name shown to cashier and on the bill.
    pub name: String,

    /// Free-form grouping ("Beverages", "Momo", ...).
    pub category: Option<String>,

    /// Tax-inclusive price in paisa.
    pub price_paisa: i64,

    /// Purchase cost in paisa (for margin reports).
    pub cost_paisa: Option<i64>,

    /// VAT rate in basis points (1300 = 13%). Zero for VAT-exempt goods.
    pub tax_rate_bps: u32,

    /// Whether sales decrement `current_stock`.
    pub track_inventory: bool,

    pub current_stock: i64,

    /// Soft delete flag.
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paisa(self.price_paisa)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Checks if `quantity` can be sold given the tracked stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        !self.track_inventory || self.current_stock >= quantity
    }
}

/// A sellable variant of a product (size, flavour, half/full plate).
///
/// Variants carry their own SKU and price; tax rate and stock tracking come
/// from the parent product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: String,
    pub product_id: String,
    pub sku: String,
    /// Short label, e.g. "1 L" or "Half plate".
    pub name: String,
    pub price_paisa: i64,
}

impl ProductVariant {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paisa(self.price_paisa)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a recorded sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale has been paid (or put on khata) and finalised.
    #[default]
    Completed,
    /// Sale was cancelled after the fact.
    Voided,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    /// Card on an external terminal.
    Card,
    /// QR wallet payment (Fonepay, eSewa, Khalti).
    Fonepay,
    /// Sold on credit, posted to the customer's khata.
    Khata,
}

impl PaymentMethod {
    /// Credit sales need a customer to post the balance against.
    pub fn requires_customer(&self) -> bool {
        matches!(self, PaymentMethod::Khata)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Fonepay => "fonepay",
            PaymentMethod::Khata => "khata",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale with its frozen pricing breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub receipt_number: String,
    pub status: SaleStatus,
    /// Set for khata sales.
    pub customer_id: Option<String>,
    pub subtotal_paisa: i64,
    pub item_discount_paisa: i64,
    pub cart_discount_paisa: i64,
    /// VAT contained in `total_paisa` (informational).
    pub tax_paisa: i64,
    pub total_paisa: i64,
    pub device_id: String,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub voided_at: Option<DateTime<Utc>>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paisa(self.total_paisa)
    }

    /// Item and cart discounts together.
    pub fn discount_total(&self) -> Money {
        Money::from_paisa(self.item_discount_paisa + self.cart_discount_paisa)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Snapshot pattern: product data is frozen at sale time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub unit_price_paisa: i64,
    pub quantity: i64,
    /// unit price × quantity.
    pub line_subtotal_paisa: i64,
    /// Item-level discount only; the cart discount lives on the sale.
    pub discount_paisa: i64,
    pub net_paisa: i64,
    pub tax_rate_bps: u32,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Payment
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    pub method: PaymentMethod,
    pub amount_paisa: i64,
    /// For cash: amount handed over by the customer.
    pub tendered_paisa: Option<i64>,
    /// For cash: change returned.
    pub change_paisa: Option<i64>,
    /// Wallet transaction id, card auth code, ...
    pub reference: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_paisa(self.amount_paisa)
    }
}

// =============================================================================
// Khata (customer credit ledger)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Direction of a khata ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum KhataEntryKind {
    /// Goods taken on credit; increases what the customer owes.
    Credit,
    /// Money paid back; decreases what the customer owes.
    Repayment,
}

/// One line of a customer's khata. `amount_paisa` is always positive; the
/// kind gives the direction.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct KhataEntry {
    pub id: String,
    pub customer_id: String,
    pub kind: KhataEntryKind,
    pub amount_paisa: i64,
    pub sale_id: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl KhataEntry {
    /// Effect of this entry on the outstanding balance.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            KhataEntryKind::Credit => Money::from_paisa(self.amount_paisa),
            KhataEntryKind::Repayment => Money::from_paisa(-self.amount_paisa),
        }
    }
}

/// Outstanding balance: credits minus repayments. Negative means the shop
/// holds an advance for the customer.
pub fn khata_balance<'a>(entries: impl IntoIterator<Item = &'a KhataEntry>) -> Money {
    entries.into_iter().map(KhataEntry::signed_amount).sum()
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregated figures for completed sales on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub sale_count: i64,
    pub gross_paisa: i64,
    pub discount_paisa: i64,
    pub tax_paisa: i64,
    pub net_paisa: i64,
    /// Portion of `net_paisa` sold on credit.
    pub khata_paisa: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

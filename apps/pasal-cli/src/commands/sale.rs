//! # Sale Commands
//!
//! `pasal checkout` turns a priced cart into a recorded sale; `pasal sale`
//! shows or voids one afterwards.
//!
//! ## Checkout Flow
//! ```text
//! cart file ──► Cart ──► PricingEngine ──► build_sale ──► record_sale ──► receipt
//!                                            │               │
//!                                            │               ├── receipt number
//!                                            │               ├── stock decrement
//!                                            │               └── khata credit
//!                                            └── tender / change / customer checks
//! ```

use chrono::{DateTime, Local, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use super::khata::resolve_customer;
use super::price::{cart_from_source, read_cart_source};
use super::{money, print_json};
use crate::config::PasalConfig;
use crate::error::{CliError, CliResult};
use pasal_core::{
    Cart, CoreError, Customer, Money, Payment, PaymentMethod, PricingEngine, PricingResult, Sale,
    SaleItem, SaleStatus,
};
use pasal_db::repository::sale::{generate_payment_id, generate_sale_id, generate_sale_item_id};
use pasal_db::Database;

/// Payment method as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    Cash,
    Card,
    Fonepay,
    Khata,
}

impl From<MethodArg> for PaymentMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Cash => PaymentMethod::Cash,
            MethodArg::Card => PaymentMethod::Card,
            MethodArg::Fonepay => PaymentMethod::Fonepay,
            MethodArg::Khata => PaymentMethod::Khata,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub method: PaymentMethod,
    /// Customer id or phone number.
    pub customer: Option<String>,
    /// Cash handed over; defaults to the exact total.
    pub tendered: Option<Money>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutOptions {
    pub fn new(method: PaymentMethod) -> Self {
        CheckoutOptions {
            method,
            customer: None,
            tendered: None,
            reference: None,
            notes: None,
        }
    }
}

/// A sale ready to be recorded. The receipt number is assigned on insert.
#[derive(Debug, Clone)]
pub struct PreparedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payment: Payment,
}

/// Everything printed on a receipt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub store_name: String,
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<Payment>,
    pub customer: Option<Customer>,
}

// =============================================================================
// Checkout
// =============================================================================

pub async fn checkout(
    config: &PasalConfig,
    db: &Database,
    cart_path: &Path,
    options: &CheckoutOptions,
    json: bool,
) -> CliResult<()> {
    let cart = cart_from_source(db, read_cart_source(cart_path)?).await?;
    let receipt = checkout_cart(config, db, &cart, options).await?;

    if json {
        return print_json(&receipt);
    }

    print!("{}", render_receipt(config, &receipt));
    Ok(())
}

/// Prices and records `cart`, returning the stored receipt.
pub async fn checkout_cart(
    config: &PasalConfig,
    db: &Database,
    cart: &Cart,
    options: &CheckoutOptions,
) -> CliResult<Receipt> {
    let customer = match options.customer.as_deref() {
        Some(key) => Some(resolve_customer(db, key).await?),
        None => None,
    };

    let totals = PricingEngine::new(config.vat_rate).compute(cart);
    let prepared = build_sale(
        cart,
        &totals,
        options,
        customer.as_ref().map(|c| c.id.as_str()),
        &config.device_id,
        Utc::now(),
    )?;

    let sale = db
        .sales()
        .record_sale(prepared.sale, &prepared.items, std::slice::from_ref(&prepared.payment))
        .await?;

    info!(receipt_number = %sale.receipt_number, method = options.method.as_str(), "Checkout complete");

    Ok(Receipt {
        store_name: config.store_name.clone(),
        sale,
        items: prepared.items,
        payments: vec![prepared.payment],
        customer,
    })
}

/// Builds the sale rows for a priced cart, settled by one payment.
///
/// ## Rules
/// - The cart must not be empty
/// - Khata needs a customer to post the credit against
/// - Cash tendered must cover the total; change is the difference
/// - Card and wallet payments are taken for the exact total
pub fn build_sale(
    cart: &Cart,
    totals: &PricingResult,
    options: &CheckoutOptions,
    customer_id: Option<&str>,
    device_id: &str,
    now: DateTime<Utc>,
) -> CliResult<PreparedSale> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart.into());
    }

    if options.method.requires_customer() && customer_id.is_none() {
        return Err(CoreError::CustomerRequired {
            method: options.method.as_str().to_string(),
        }
        .into());
    }

    let sale_id = generate_sale_id();
    let due = totals.grand_total;

    let (tendered, change) = match options.method {
        PaymentMethod::Cash => {
            let tendered = options.tendered.unwrap_or(due);
            let change = totals
                .change_for(tendered)
                .ok_or(CoreError::InsufficientTender { due, tendered })?;
            (Some(tendered.paisa()), Some(change.paisa()))
        }
        _ => {
            if options.tendered.is_some() {
                debug!(method = options.method.as_str(), "Ignoring tendered amount for non-cash payment");
            }
            (None, None)
        }
    };

    let items = cart
        .items
        .iter()
        .zip(&totals.lines)
        .map(|(line, line_totals)| SaleItem {
            id: generate_sale_item_id(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            variant_id: line.variant_id.clone(),
            sku_snapshot: line.sku.clone(),
            name_snapshot: line.name.clone(),
            unit_price_paisa: line.unit_price.paisa(),
            quantity: line.quantity,
            line_subtotal_paisa: line_totals.line_subtotal.paisa(),
            discount_paisa: line_totals.discount.paisa(),
            net_paisa: line_totals.net.paisa(),
            tax_rate_bps: line.tax_rate.bps(),
            created_at: now,
        })
        .collect();

    let payment = Payment {
        id: generate_payment_id(),
        sale_id: sale_id.clone(),
        method: options.method,
        amount_paisa: due.paisa(),
        tendered_paisa: tendered,
        change_paisa: change,
        reference: options.reference.clone(),
        created_at: now,
    };

    let sale = Sale {
        id: sale_id,
        receipt_number: String::new(),
        status: SaleStatus::Completed,
        customer_id: customer_id.map(str::to_string),
        subtotal_paisa: totals.subtotal.paisa(),
        item_discount_paisa: totals.item_discount_total.paisa(),
        cart_discount_paisa: totals.cart_discount_total.paisa(),
        tax_paisa: totals.tax_amount.paisa(),
        total_paisa: due.paisa(),
        device_id: device_id.to_string(),
        notes: options.notes.clone(),
        created_at: now,
        voided_at: None,
    };

    Ok(PreparedSale { sale, items, payment })
}

// =============================================================================
// Show / Void
// =============================================================================

pub async fn show(config: &PasalConfig, db: &Database, key: &str, json: bool) -> CliResult<()> {
    let sale = find_sale(db, key).await?;
    let receipt = load_receipt(config, db, sale).await?;

    if json {
        return print_json(&receipt);
    }

    print!("{}", render_receipt(config, &receipt));
    Ok(())
}

pub async fn void(config: &PasalConfig, db: &Database, key: &str, json: bool) -> CliResult<()> {
    let sale = find_sale(db, key).await?;
    let voided = db.sales().void_sale(&sale.id).await?;
    let receipt = load_receipt(config, db, voided).await?;

    if json {
        return print_json(&receipt);
    }

    println!(
        "Voided {} ({}). Stock restored.",
        receipt.sale.receipt_number,
        money(config, receipt.sale.total())
    );
    Ok(())
}

/// Finds a sale by receipt number, falling back to its id.
pub async fn find_sale(db: &Database, key: &str) -> CliResult<Sale> {
    let sales = db.sales();

    if let Some(sale) = sales.get_by_receipt(key).await? {
        return Ok(sale);
    }
    if let Some(sale) = sales.get_by_id(key).await? {
        return Ok(sale);
    }

    Err(CliError::not_found("Sale", key))
}

async fn load_receipt(config: &PasalConfig, db: &Database, sale: Sale) -> CliResult<Receipt> {
    let items = db.sales().get_items(&sale.id).await?;
    let payments = db.sales().get_payments(&sale.id).await?;
    let customer = match sale.customer_id.as_deref() {
        Some(id) => db.khata().get_customer(id).await?,
        None => None,
    };

    Ok(Receipt {
        store_name: config.store_name.clone(),
        sale,
        items,
        payments,
        customer,
    })
}

// =============================================================================
// Receipt Rendering
// =============================================================================

const RECEIPT_WIDTH: usize = 48;

pub fn render_receipt(config: &PasalConfig, receipt: &Receipt) -> String {
    ReceiptText { config, receipt }.to_string()
}

struct ReceiptText<'a> {
    config: &'a PasalConfig,
    receipt: &'a Receipt,
}

impl ReceiptText<'_> {
    fn row(&self, f: &mut fmt::Formatter<'_>, label: &str, amount: Money) -> fmt::Result {
        writeln!(f, "{:<34}{:>14}", label, money(self.config, amount))
    }
}

impl fmt::Display for ReceiptText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ReceiptText { config, receipt } = *self;
        let sale = &receipt.sale;
        let rule = "-".repeat(RECEIPT_WIDTH);

        writeln!(f, "{:^width$}", receipt.store_name, width = RECEIPT_WIDTH)?;
        if sale.status == SaleStatus::Voided {
            writeln!(f, "{:^width$}", "*** VOID ***", width = RECEIPT_WIDTH)?;
        }
        writeln!(f, "Receipt: {}", sale.receipt_number)?;
        writeln!(
            f,
            "Date:    {}",
            sale.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        )?;
        if let Some(customer) = &receipt.customer {
            writeln!(f, "Customer: {}", customer.name)?;
        }
        writeln!(f, "{rule}")?;

        for item in &receipt.items {
            writeln!(
                f,
                "{:>4}  {:<28}{:>14}",
                item.quantity,
                item.name_snapshot,
                money(config, Money::from_paisa(item.line_subtotal_paisa))
            )?;
            if item.discount_paisa > 0 {
                writeln!(
                    f,
                    "      less {}",
                    money(config, Money::from_paisa(item.discount_paisa))
                )?;
            }
        }

        writeln!(f, "{rule}")?;
        self.row(f, "Subtotal", Money::from_paisa(sale.subtotal_paisa))?;
        if !sale.discount_total().is_zero() {
            self.row(f, "Discount", -sale.discount_total())?;
        }
        self.row(f, "Total", sale.total())?;
        self.row(f, "  incl. VAT", Money::from_paisa(sale.tax_paisa))?;
        writeln!(f, "{rule}")?;

        for payment in &receipt.payments {
            self.row(f, &format!("Paid ({})", payment.method.as_str()), payment.amount())?;
            if let Some(tendered) = payment.tendered_paisa {
                self.row(f, "  Tendered", Money::from_paisa(tendered))?;
            }
            if let Some(change) = payment.change_paisa.filter(|c| *c > 0) {
                self.row(f, "  Change", Money::from_paisa(change))?;
            }
            if let Some(reference) = &payment.reference {
                writeln!(f, "  Ref: {reference}")?;
            }
        }

        if let Some(notes) = &sale.notes {
            writeln!(f, "Note: {notes}")?;
        }
        writeln!(f, "{:^width$}", "Dhanyabad!", width = RECEIPT_WIDTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_config;
    use pasal_core::{Discount, LineItem, Product};
    use pasal_db::DbConfig;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.push_line(LineItem::new("p1", "CHIYA", "Milk Tea", Money::from_rupees(30), 3));
        let mut momo = LineItem::new("p2", "MOMO", "Buff Momo", Money::from_rupees(180), 1);
        momo.discount = Discount::rupees(20);
        cart.push_line(momo);
        cart
    }

    fn priced(cart: &Cart) -> PricingResult {
        PricingEngine::default().compute(cart)
    }

    #[test]
    fn test_build_sale_cash_with_change() {
        let cart = cart();
        let totals = priced(&cart);
        let mut options = CheckoutOptions::new(PaymentMethod::Cash);
        options.tendered = Some(Money::from_rupees(500));

        let prepared = build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()).unwrap();

        // 90 + 180 - 20 = 250
        assert_eq!(prepared.sale.total_paisa, 25_000);
        assert_eq!(prepared.sale.item_discount_paisa, 2_000);
        assert_eq!(prepared.sale.tax_paisa, totals.tax_amount.paisa());
        assert_eq!(prepared.payment.amount_paisa, 25_000);
        assert_eq!(prepared.payment.tendered_paisa, Some(50_000));
        assert_eq!(prepared.payment.change_paisa, Some(25_000));

        assert_eq!(prepared.items.len(), 2);
        assert!(prepared.items.iter().all(|i| i.sale_id == prepared.sale.id));
        assert_eq!(prepared.items[1].discount_paisa, 2_000);
        assert_eq!(prepared.items[1].net_paisa, 16_000);
    }

    #[test]
    fn test_build_sale_exact_cash_by_default() {
        let cart = cart();
        let totals = priced(&cart);
        let options = CheckoutOptions::new(PaymentMethod::Cash);

        let prepared = build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()).unwrap();
        assert_eq!(prepared.payment.tendered_paisa, Some(25_000));
        assert_eq!(prepared.payment.change_paisa, Some(0));
    }

    #[test]
    fn test_build_sale_short_tender() {
        let cart = cart();
        let totals = priced(&cart);
        let mut options = CheckoutOptions::new(PaymentMethod::Cash);
        options.tendered = Some(Money::from_rupees(200));

        let err = build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::InsufficientTender { due, tendered })
                if due == Money::from_rupees(250) && tendered == Money::from_rupees(200)
        ));
    }

    #[test]
    fn test_build_sale_khata_needs_customer() {
        let cart = cart();
        let totals = priced(&cart);
        let options = CheckoutOptions::new(PaymentMethod::Khata);

        assert!(matches!(
            build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()),
            Err(CliError::Core(CoreError::CustomerRequired { .. }))
        ));

        let prepared = build_sale(&cart, &totals, &options, Some("c1"), "counter-01", Utc::now()).unwrap();
        assert_eq!(prepared.sale.customer_id.as_deref(), Some("c1"));
        assert_eq!(prepared.payment.tendered_paisa, None);
        assert_eq!(prepared.payment.change_paisa, None);
    }

    #[test]
    fn test_build_sale_empty_cart() {
        let cart = Cart::new();
        let totals = priced(&cart);
        let options = CheckoutOptions::new(PaymentMethod::Card);

        assert!(matches!(
            build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()),
            Err(CliError::Core(CoreError::EmptyCart))
        ));
    }

    #[tokio::test]
    async fn test_checkout_khata_posts_credit() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let product = Product {
            id: "p-dahi".to_string(),
            sku: "DAHI".to_string(),
            barcode: None,
            name: "Dahi 500ml".to_string(),
            category: None,
            price_paisa: 9_000,
            cost_paisa: None,
            tax_rate_bps: 1300,
            track_inventory: true,
            current_stock: 5,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        db.khata()
            .create_customer("Hari", Some("9841000002"))
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_item(&product, None, 2).unwrap();

        let mut options = CheckoutOptions::new(PaymentMethod::Khata);
        options.customer = Some("9841000002".to_string());

        let receipt = checkout_cart(&config, &db, &cart, &options).await.unwrap();
        assert!(!receipt.sale.receipt_number.is_empty());
        assert_eq!(receipt.sale.total_paisa, 18_000);

        let customer = receipt.customer.clone().unwrap();
        assert_eq!(db.khata().balance(&customer.id).await.unwrap(), Money::from_rupees(180));

        let stored = db.products().get_by_id("p-dahi").await.unwrap().unwrap();
        assert_eq!(stored.current_stock, 3);

        let found = find_sale(&db, &receipt.sale.receipt_number).await.unwrap();
        assert_eq!(found.id, receipt.sale.id);
    }

    #[tokio::test]
    async fn test_checkout_unknown_customer() {
        let config = test_config();
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut options = CheckoutOptions::new(PaymentMethod::Khata);
        options.customer = Some("nobody".to_string());

        assert!(matches!(
            checkout_cart(&config, &db, &cart(), &options).await,
            Err(CliError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_find_sale_missing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(matches!(
            find_sale(&db, "20260101-01-0001").await,
            Err(CliError::NotFound { .. })
        ));
    }

    #[test]
    fn test_render_receipt() {
        let config = test_config();
        let cart = cart();
        let totals = priced(&cart);
        let mut options = CheckoutOptions::new(PaymentMethod::Cash);
        options.tendered = Some(Money::from_rupees(300));

        let prepared = build_sale(&cart, &totals, &options, None, "counter-01", Utc::now()).unwrap();
        let mut sale = prepared.sale;
        sale.receipt_number = "20261019-01-0007".to_string();

        let receipt = Receipt {
            store_name: "Thamel Kirana".to_string(),
            sale,
            items: prepared.items,
            payments: vec![prepared.payment],
            customer: None,
        };
        let text = render_receipt(&config, &receipt);

        assert!(text.contains("Thamel Kirana"));
        assert!(text.contains("Receipt: 20261019-01-0007"));
        assert!(text.contains("Milk Tea"));
        assert!(text.contains("less Rs. 20.00"));
        assert!(text.contains("Rs. 250.00"));
        assert!(text.contains("Paid (cash)"));
        assert!(text.contains("Rs. 50.00"));
        assert!(!text.contains("VOID"));
    }
}

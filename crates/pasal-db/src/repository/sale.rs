//! # Sale Repository
//!
//! Database operations for sales, sale items and payments.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. RECORD (one transaction)                                            │
//! │     └── record_sale()                                                   │
//! │         ├── next receipt number for the device and day                  │
//! │         ├── INSERT sales, sale_items, payments                          │
//! │         ├── khata payment → Credit entry on the customer's ledger       │
//! │         └── tracked products → current_stock -= quantity                │
//! │                                                                         │
//! │  2. (OPTIONAL) VOID (one transaction)                                   │
//! │     └── void_sale()                                                     │
//! │         ├── status = voided, voided_at = now                            │
//! │         ├── tracked products → current_stock += quantity                │
//! │         └── khata credit → compensating Repayment entry                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failure at any step rolls the whole transaction back: no half-written
//! sale, no stock moved, nothing posted to the khata.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::khata::insert_entry;
use pasal_core::{
    CoreError, DailySummary, KhataEntry, KhataEntryKind, Payment, PaymentMethod, Sale, SaleItem,
    SaleStatus,
};

const SALE_COLUMNS: &str = "id, receipt_number, status, customer_id, subtotal_paisa, \
     item_discount_paisa, cart_discount_paisa, tax_paisa, total_paisa, device_id, notes, \
     created_at, voided_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, variant_id, sku_snapshot, name_snapshot, \
     unit_price_paisa, quantity, line_subtotal_paisa, discount_paisa, net_paisa, tax_rate_bps, \
     created_at";

const PAYMENT_COLUMNS: &str =
    "id, sale_id, method, amount_paisa, tendered_paisa, change_paisa, reference, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a completed sale with its items and payments atomically.
    ///
    /// The receipt number is assigned here from the device's daily counter;
    /// whatever `sale.receipt_number` holds on input is replaced. Returns the
    /// sale as stored.
    ///
    /// ## Errors
    /// - `CoreError::EmptyCart` if `items` is empty
    /// - `CoreError::CustomerRequired` for a khata payment without a customer
    /// - `CoreError::ProductNotFound` / `InsufficientStock` for stock moves
    pub async fn record_sale(
        &self,
        mut sale: Sale,
        items: &[SaleItem],
        payments: &[Payment],
    ) -> DbResult<Sale> {
        if items.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        if let Some(p) = payments.iter().find(|p| p.method.requires_customer()) {
            if sale.customer_id.is_none() {
                return Err(CoreError::CustomerRequired {
                    method: p.method.as_str().to_string(),
                }
                .into());
            }
        }

        let mut tx = self.pool.begin().await?;

        let local_date = sale.created_at.with_timezone(&Local).date_naive();
        sale.receipt_number = next_receipt_number(&mut tx, &sale.device_id, local_date).await?;
        sale.status = SaleStatus::Completed;
        sale.voided_at = None;

        debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, receipt_number, status, customer_id,
                subtotal_paisa, item_discount_paisa, cart_discount_paisa,
                tax_paisa, total_paisa, device_id, notes,
                created_at, voided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.receipt_number)
        .bind(sale.status)
        .bind(&sale.customer_id)
        .bind(sale.subtotal_paisa)
        .bind(sale.item_discount_paisa)
        .bind(sale.cart_discount_paisa)
        .bind(sale.tax_paisa)
        .bind(sale.total_paisa)
        .bind(&sale.device_id)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.voided_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in items.iter().enumerate() {
            insert_item(&mut tx, &sale.id, item, position as i64).await?;
            move_stock(&mut tx, &item.product_id, -item.quantity).await?;
        }

        for payment in payments {
            insert_payment(&mut tx, &sale.id, payment).await?;

            if payment.method == PaymentMethod::Khata && payment.amount_paisa > 0 {
                if let Some(customer_id) = &sale.customer_id {
                    let entry = KhataEntry {
                        id: Uuid::new_v4().to_string(),
                        customer_id: customer_id.clone(),
                        kind: KhataEntryKind::Credit,
                        amount_paisa: payment.amount_paisa,
                        sale_id: Some(sale.id.clone()),
                        note: Some(format!("Sale {}", sale.receipt_number)),
                        created_at: sale.created_at,
                    };
                    insert_entry(&mut tx, &entry).await?;
                }
            }
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            receipt_number = %sale.receipt_number,
            total = %sale.total(),
            items = items.len(),
            "Sale recorded"
        );

        Ok(sale)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    pub async fn get_by_receipt(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE receipt_number = ?1"
        ))
        .bind(receipt_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Items of a sale in the order they were rung up.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE sale_id = ?1 ORDER BY created_at, rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Voids a completed sale, returning stock and reversing any khata credit.
    pub async fn void_sale(&self, sale_id: &str) -> DbResult<Sale> {
        let mut tx = self.pool.begin().await?;

        let mut sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(sale_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if sale.status == SaleStatus::Voided {
            return Err(CoreError::SaleAlreadyVoided(sale.receipt_number).into());
        }

        let now = Utc::now();

        sqlx::query("UPDATE sales SET status = ?2, voided_at = ?3 WHERE id = ?1")
            .bind(sale_id)
            .bind(SaleStatus::Voided)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let quantities: Vec<(String, i64)> =
            sqlx::query_as("SELECT product_id, quantity FROM sale_items WHERE sale_id = ?1")
                .bind(sale_id)
                .fetch_all(&mut *tx)
                .await?;

        for (product_id, quantity) in quantities {
            move_stock(&mut tx, &product_id, quantity).await?;
        }

        let credits = sqlx::query_as::<_, KhataEntry>(
            "SELECT id, customer_id, kind, amount_paisa, sale_id, note, created_at \
             FROM khata_entries WHERE sale_id = ?1 AND kind = ?2",
        )
        .bind(sale_id)
        .bind(KhataEntryKind::Credit)
        .fetch_all(&mut *tx)
        .await?;

        for credit in credits {
            let reversal = KhataEntry {
                id: Uuid::new_v4().to_string(),
                customer_id: credit.customer_id,
                kind: KhataEntryKind::Repayment,
                amount_paisa: credit.amount_paisa,
                sale_id: Some(sale_id.to_string()),
                note: Some(format!("Void of sale {}", sale.receipt_number)),
                created_at: now,
            };
            insert_entry(&mut tx, &reversal).await?;
        }

        tx.commit().await?;

        sale.status = SaleStatus::Voided;
        sale.voided_at = Some(now);

        info!(sale_id = %sale_id, receipt_number = %sale.receipt_number, "Sale voided");
        Ok(sale)
    }

    /// Totals of completed sales for one calendar day in `tz`.
    ///
    /// Voided sales are excluded; the tax figure is the sum of the VAT frozen
    /// on each sale, so it always matches the printed receipts.
    pub async fn daily_summary<Tz: TimeZone>(&self, date: NaiveDate, tz: &Tz) -> DbResult<DailySummary> {
        let start = day_start(date, tz)?;
        let next_day = date
            .succ_opt()
            .ok_or_else(|| DbError::Internal(format!("No day after {date}")))?;
        let end = day_start(next_day, tz)?;

        debug!(%date, %start, %end, "Computing daily summary");

        let (sale_count, gross_paisa, discount_paisa, tax_paisa, net_paisa): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(subtotal_paisa), 0),
                    COALESCE(SUM(item_discount_paisa + cart_discount_paisa), 0),
                    COALESCE(SUM(tax_paisa), 0),
                    COALESCE(SUM(total_paisa), 0)
                FROM sales
                WHERE status = 'completed' AND created_at >= ?1 AND created_at < ?2
                "#,
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        let khata_paisa: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.amount_paisa), 0)
            FROM payments p
            INNER JOIN sales s ON s.id = p.sale_id
            WHERE p.method = 'khata'
              AND s.status = 'completed'
              AND s.created_at >= ?1 AND s.created_at < ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary {
            date,
            sale_count,
            gross_paisa,
            discount_paisa,
            tax_paisa,
            net_paisa,
            khata_paisa,
        })
    }
}

async fn insert_item(
    conn: &mut SqliteConnection,
    sale_id: &str,
    item: &SaleItem,
    position: i64,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, variant_id,
            sku_snapshot, name_snapshot, unit_price_paisa, quantity,
            line_subtotal_paisa, discount_paisa, net_paisa, tax_rate_bps,
            position, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&item.id)
    .bind(sale_id)
    .bind(&item.product_id)
    .bind(&item.variant_id)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_paisa)
    .bind(item.quantity)
    .bind(item.line_subtotal_paisa)
    .bind(item.discount_paisa)
    .bind(item.net_paisa)
    .bind(item.tax_rate_bps)
    .bind(position)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_payment(conn: &mut SqliteConnection, sale_id: &str, payment: &Payment) -> DbResult<()> {
    debug!(sale_id = %sale_id, method = payment.method.as_str(), amount = %payment.amount(), "Recording payment");

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, sale_id, method, amount_paisa,
            tendered_paisa, change_paisa, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&payment.id)
    .bind(sale_id)
    .bind(payment.method)
    .bind(payment.amount_paisa)
    .bind(payment.tendered_paisa)
    .bind(payment.change_paisa)
    .bind(&payment.reference)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Moves stock for a tracked product by `delta`. Untracked products are left
/// alone. A sale may not take stock below zero.
async fn move_stock(conn: &mut SqliteConnection, product_id: &str, delta: i64) -> DbResult<()> {
    let row: Option<(String, bool, i64)> = sqlx::query_as(
        "SELECT sku, track_inventory, current_stock FROM products WHERE id = ?1",
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some((sku, track_inventory, current_stock)) = row else {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    };

    if !track_inventory {
        return Ok(());
    }

    if current_stock + delta < 0 {
        warn!(sku = %sku, available = current_stock, requested = -delta, "Stock ran out at checkout");
        return Err(CoreError::InsufficientStock {
            sku,
            available: current_stock,
            requested: -delta,
        }
        .into());
    }

    sqlx::query("UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Next receipt number for the device and day, from the count already issued.
async fn next_receipt_number(
    conn: &mut SqliteConnection,
    device_id: &str,
    date: NaiveDate,
) -> DbResult<String> {
    let prefix = receipt_prefix(device_id, date);

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE receipt_number LIKE ?1")
        .bind(format!("{prefix}-%"))
        .fetch_one(&mut *conn)
        .await?;

    Ok(format_receipt_number(&prefix, issued + 1))
}

/// `YYYYMMDD-DD`, where DD is the last two characters of the device id.
fn receipt_prefix(device_id: &str, date: NaiveDate) -> String {
    let chars: Vec<char> = device_id.trim().chars().collect();
    let device_code: String = if chars.len() < 2 {
        "00".to_string()
    } else {
        chars[chars.len() - 2..].iter().collect::<String>().to_uppercase()
    };

    format!("{}-{}", date.format("%Y%m%d"), device_code)
}

/// Receipt number in format `YYYYMMDD-DD-NNNN`, e.g. `20261019-01-0001`.
fn format_receipt_number(prefix: &str, seq: i64) -> String {
    format!("{prefix}-{seq:04}")
}

fn day_start<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DbResult<DateTime<Utc>> {
    tz.from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| DbError::Internal(format!("No local midnight on {date}")))
}

pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn generate_payment_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use pasal_core::{Money, Product};

    fn product(sku: &str, price_paisa: i64, stock: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            barcode: None,
            name: sku.to_string(),
            category: None,
            price_paisa,
            cost_paisa: None,
            tax_rate_bps: 1300,
            track_inventory: stock.is_some(),
            current_stock: stock.unwrap_or(0),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale(total_paisa: i64, customer_id: Option<&str>) -> Sale {
        Sale {
            id: generate_sale_id(),
            receipt_number: String::new(),
            status: SaleStatus::Completed,
            customer_id: customer_id.map(str::to_string),
            subtotal_paisa: total_paisa,
            item_discount_paisa: 0,
            cart_discount_paisa: 0,
            tax_paisa: Money::from_paisa(total_paisa)
                .extract_inclusive_tax(pasal_core::NEPAL_VAT_RATE)
                .paisa(),
            total_paisa,
            device_id: "counter-01".to_string(),
            notes: None,
            created_at: Utc::now(),
            voided_at: None,
        }
    }

    fn item(product: &Product, quantity: i64) -> SaleItem {
        let line = product.price_paisa * quantity;
        SaleItem {
            id: generate_sale_item_id(),
            sale_id: String::new(),
            product_id: product.id.clone(),
            variant_id: None,
            sku_snapshot: product.sku.clone(),
            name_snapshot: product.name.clone(),
            unit_price_paisa: product.price_paisa,
            quantity,
            line_subtotal_paisa: line,
            discount_paisa: 0,
            net_paisa: line,
            tax_rate_bps: product.tax_rate_bps,
            created_at: Utc::now(),
        }
    }

    fn payment(method: PaymentMethod, amount_paisa: i64) -> Payment {
        Payment {
            id: generate_payment_id(),
            sale_id: String::new(),
            method,
            amount_paisa,
            tendered_paisa: None,
            change_paisa: None,
            reference: None,
            created_at: Utc::now(),
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_record_sale_round_trip() {
        let db = db().await;
        let wai = db.products().insert(&product("WAIWAI", 2_500, None)).await.unwrap();
        let dahi = db.products().insert(&product("DAHI", 11_300, None)).await.unwrap();

        let items = vec![item(&wai, 2), item(&dahi, 1)];
        let stored = db
            .sales()
            .record_sale(sale(16_300, None), &items, &[payment(PaymentMethod::Cash, 16_300)])
            .await
            .unwrap();

        assert!(stored.receipt_number.ends_with("-01-0001"));

        let fetched = db.sales().get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(fetched.total_paisa, 16_300);
        assert_eq!(fetched.status, SaleStatus::Completed);

        let by_receipt = db
            .sales()
            .get_by_receipt(&stored.receipt_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_receipt.id, stored.id);

        let items = db.sales().get_items(&stored.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].sku_snapshot, "WAIWAI");
        assert_eq!(items[0].sale_id, stored.id);
        assert_eq!(items[1].sku_snapshot, "DAHI");

        let payments = db.sales().get_payments(&stored.id).await.unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].method, PaymentMethod::Cash);
    }

    #[tokio::test]
    async fn test_receipt_numbers_increment_per_day() {
        let db = db().await;
        let chiya = db.products().insert(&product("CHIYA", 2_500, None)).await.unwrap();

        let first = db
            .sales()
            .record_sale(sale(2_500, None), &[item(&chiya, 1)], &[payment(PaymentMethod::Cash, 2_500)])
            .await
            .unwrap();
        let second = db
            .sales()
            .record_sale(sale(2_500, None), &[item(&chiya, 1)], &[payment(PaymentMethod::Cash, 2_500)])
            .await
            .unwrap();

        assert!(first.receipt_number.ends_with("-0001"));
        assert!(second.receipt_number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_record_sale_moves_tracked_stock() {
        let db = db().await;
        let coke = db.products().insert(&product("COKE", 7_000, Some(10))).await.unwrap();
        let chiya = db.products().insert(&product("CHIYA", 2_500, None)).await.unwrap();

        db.sales()
            .record_sale(
                sale(23_500, None),
                &[item(&coke, 3), item(&chiya, 1)],
                &[payment(PaymentMethod::Fonepay, 23_500)],
            )
            .await
            .unwrap();

        let coke = db.products().get_by_id(&coke.id).await.unwrap().unwrap();
        assert_eq!(coke.current_stock, 7);
        let chiya = db.products().get_by_id(&chiya.id).await.unwrap().unwrap();
        assert_eq!(chiya.current_stock, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = db().await;
        let dahi = db.products().insert(&product("DAHI", 11_300, Some(2))).await.unwrap();
        let coke = db.products().insert(&product("COKE", 7_000, Some(10))).await.unwrap();

        let err = db
            .sales()
            .record_sale(
                sale(54_000, None),
                &[item(&coke, 1), item(&dahi, 3)],
                &[payment(PaymentMethod::Cash, 54_000)],
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // Nothing from the failed checkout survived
        let coke = db.products().get_by_id(&coke.id).await.unwrap().unwrap();
        assert_eq!(coke.current_stock, 10);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_record_sale_rejects_empty_and_missing_customer() {
        let db = db().await;
        let momo = db.products().insert(&product("MOMO", 18_000, None)).await.unwrap();

        let err = db
            .sales()
            .record_sale(sale(0, None), &[], &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::EmptyCart)));

        let err = db
            .sales()
            .record_sale(sale(18_000, None), &[item(&momo, 1)], &[payment(PaymentMethod::Khata, 18_000)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::CustomerRequired { .. })));
    }

    #[tokio::test]
    async fn test_khata_sale_posts_credit() {
        let db = db().await;
        let momo = db.products().insert(&product("MOMO", 18_000, None)).await.unwrap();
        let customer = db.khata().create_customer("Ram", None).await.unwrap();

        let stored = db
            .sales()
            .record_sale(
                sale(36_000, Some(&customer.id)),
                &[item(&momo, 2)],
                &[payment(PaymentMethod::Khata, 36_000)],
            )
            .await
            .unwrap();

        assert_eq!(db.khata().balance(&customer.id).await.unwrap(), Money::from_rupees(360));

        let entries = db.khata().entries_for(&customer.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sale_id.as_deref(), Some(stored.id.as_str()));
    }

    #[tokio::test]
    async fn test_void_sale_reverses_effects() {
        let db = db().await;
        let coke = db.products().insert(&product("COKE", 7_000, Some(5))).await.unwrap();
        let customer = db.khata().create_customer("Sita", None).await.unwrap();

        let stored = db
            .sales()
            .record_sale(
                sale(14_000, Some(&customer.id)),
                &[item(&coke, 2)],
                &[payment(PaymentMethod::Khata, 14_000)],
            )
            .await
            .unwrap();

        let voided = db.sales().void_sale(&stored.id).await.unwrap();
        assert_eq!(voided.status, SaleStatus::Voided);
        assert!(voided.voided_at.is_some());

        let coke = db.products().get_by_id(&coke.id).await.unwrap().unwrap();
        assert_eq!(coke.current_stock, 5);
        assert_eq!(db.khata().balance(&customer.id).await.unwrap(), Money::zero());

        let err = db.sales().void_sale(&stored.id).await.unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::SaleAlreadyVoided(_))));

        assert!(matches!(
            db.sales().void_sale("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let db = db().await;
        let momo = db.products().insert(&product("MOMO", 18_000, None)).await.unwrap();
        let customer = db.khata().create_customer("Hari", None).await.unwrap();

        let mut discounted = sale(16_200, None);
        discounted.subtotal_paisa = 18_000;
        discounted.cart_discount_paisa = 1_800;
        db.sales()
            .record_sale(discounted, &[item(&momo, 1)], &[payment(PaymentMethod::Cash, 16_200)])
            .await
            .unwrap();

        db.sales()
            .record_sale(
                sale(18_000, Some(&customer.id)),
                &[item(&momo, 1)],
                &[payment(PaymentMethod::Khata, 18_000)],
            )
            .await
            .unwrap();

        let voided = db
            .sales()
            .record_sale(sale(18_000, None), &[item(&momo, 1)], &[payment(PaymentMethod::Cash, 18_000)])
            .await
            .unwrap();
        db.sales().void_sale(&voided.id).await.unwrap();

        let today = Utc::now().date_naive();
        let summary = db.sales().daily_summary(today, &Utc).await.unwrap();

        assert_eq!(summary.date, today);
        assert_eq!(summary.sale_count, 2);
        assert_eq!(summary.gross_paisa, 36_000);
        assert_eq!(summary.discount_paisa, 1_800);
        assert_eq!(summary.net_paisa, 34_200);
        assert_eq!(summary.khata_paisa, 18_000);
        assert_eq!(
            summary.tax_paisa,
            Money::from_paisa(16_200).extract_inclusive_tax(pasal_core::NEPAL_VAT_RATE).paisa()
                + Money::from_paisa(18_000).extract_inclusive_tax(pasal_core::NEPAL_VAT_RATE).paisa()
        );

        let yesterday = today - Duration::days(1);
        let empty = db.sales().daily_summary(yesterday, &Utc).await.unwrap();
        assert_eq!(empty.sale_count, 0);
        assert_eq!(empty.net_paisa, 0);
    }

    #[test]
    fn test_receipt_prefix() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(receipt_prefix("counter-01", date), "20261019-01");
        assert_eq!(receipt_prefix("pos-ab", date), "20261019-AB");
        assert_eq!(receipt_prefix("x", date), "20261019-00");
        assert_eq!(format_receipt_number("20261019-01", 7), "20261019-01-0007");
    }
}

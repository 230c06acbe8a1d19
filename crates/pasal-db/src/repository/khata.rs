//! # Khata Repository
//!
//! Customers and their credit ledger ("khata").
//!
//! The ledger is append-only: a khata sale posts a `Credit`, money paid back
//! posts a `Repayment`, and a voided credit sale posts a compensating
//! `Repayment`. The balance is always derived from the entries.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use pasal_core::validation::validate_payment_amount;
use pasal_core::{khata_balance, CoreError, Customer, KhataEntry, KhataEntryKind, Money};

const ENTRY_COLUMNS: &str = "id, customer_id, kind, amount_paisa, sale_id, note, created_at";

#[derive(Debug, Clone)]
pub struct KhataRepository {
    pool: SqlitePool,
}

impl KhataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        KhataRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Customers
    // -------------------------------------------------------------------------

    /// Creates a customer. Phone numbers are unique when present.
    pub async fn create_customer(&self, name: &str, phone: Option<&str>) -> DbResult<Customer> {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            phone: phone.map(|p| p.trim().to_string()),
            created_at: Utc::now(),
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query("INSERT INTO customers (id, name, phone, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(customer.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate("phone", customer.phone.clone().unwrap_or_default())
                }
                other => other,
            })?;

        Ok(customer)
    }

    pub async fn get_customer(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, created_at FROM customers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn find_by_phone(&self, phone: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, created_at FROM customers WHERE phone = ?1",
        )
        .bind(phone.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    pub async fn list_customers(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT id, name, phone, created_at FROM customers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    // -------------------------------------------------------------------------
    // Ledger
    // -------------------------------------------------------------------------

    /// Records money paid back by a customer.
    pub async fn repay(
        &self,
        customer_id: &str,
        amount: Money,
        note: Option<&str>,
    ) -> DbResult<KhataEntry> {
        validate_payment_amount(amount).map_err(CoreError::from)?;

        if self.get_customer(customer_id).await?.is_none() {
            return Err(DbError::not_found("Customer", customer_id));
        }

        let entry = KhataEntry {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            kind: KhataEntryKind::Repayment,
            amount_paisa: amount.paisa(),
            sale_id: None,
            note: note.map(str::to_string),
            created_at: Utc::now(),
        };

        let mut conn = self.pool.acquire().await?;
        insert_entry(&mut conn, &entry).await?;

        info!(customer_id = %customer_id, amount = %amount, "Khata repayment recorded");
        Ok(entry)
    }

    /// All ledger entries for a customer, oldest first.
    pub async fn entries_for(&self, customer_id: &str) -> DbResult<Vec<KhataEntry>> {
        let entries = sqlx::query_as::<_, KhataEntry>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM khata_entries WHERE customer_id = ?1 \
             ORDER BY created_at, rowid"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Outstanding balance for a customer.
    pub async fn balance(&self, customer_id: &str) -> DbResult<Money> {
        let entries = self.entries_for(customer_id).await?;
        Ok(khata_balance(&entries))
    }
}

/// Inserts a ledger entry on an existing connection, so sale recording and
/// voiding can post entries inside their own transaction.
pub(crate) async fn insert_entry(conn: &mut SqliteConnection, entry: &KhataEntry) -> DbResult<()> {
    debug!(
        customer_id = %entry.customer_id,
        kind = ?entry.kind,
        amount_paisa = entry.amount_paisa,
        "Posting khata entry"
    );

    sqlx::query(
        "INSERT INTO khata_entries (id, customer_id, kind, amount_paisa, sale_id, note, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&entry.id)
    .bind(&entry.customer_id)
    .bind(entry.kind)
    .bind(entry.amount_paisa)
    .bind(&entry.sale_id)
    .bind(&entry.note)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_customer() {
        let db = db().await;
        let repo = db.khata();

        let ram = repo
            .create_customer(" Ram Bahadur ", Some("9801234567"))
            .await
            .unwrap();
        assert_eq!(ram.name, "Ram Bahadur");

        let found = repo.get_customer(&ram.id).await.unwrap().unwrap();
        assert_eq!(found.phone.as_deref(), Some("9801234567"));

        let by_phone = repo.find_by_phone("9801234567").await.unwrap().unwrap();
        assert_eq!(by_phone.id, ram.id);

        repo.create_customer("Sita", None).await.unwrap();
        assert_eq!(repo.list_customers().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_phone_rejected() {
        let db = db().await;
        let repo = db.khata();

        repo.create_customer("Hari", Some("9811111111")).await.unwrap();
        let err = repo
            .create_customer("Hari Dai", Some("9811111111"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "phone"));
    }

    #[tokio::test]
    async fn test_repayment_reduces_balance() {
        let db = db().await;
        let repo = db.khata();
        let customer = repo.create_customer("Gita", None).await.unwrap();

        let credit = KhataEntry {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id.clone(),
            kind: KhataEntryKind::Credit,
            amount_paisa: 50_000,
            sale_id: None,
            note: None,
            created_at: Utc::now(),
        };
        let mut conn = db.pool().acquire().await.unwrap();
        insert_entry(&mut conn, &credit).await.unwrap();
        drop(conn);

        repo.repay(&customer.id, Money::from_rupees(200), Some("cash"))
            .await
            .unwrap();

        assert_eq!(repo.balance(&customer.id).await.unwrap(), Money::from_rupees(300));

        let entries = repo.entries_for(&customer.id).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].kind, KhataEntryKind::Repayment);
        assert_eq!(entries[1].note.as_deref(), Some("cash"));
    }

    #[tokio::test]
    async fn test_repay_rejects_bad_input() {
        let db = db().await;
        let repo = db.khata();
        let customer = repo.create_customer("Bishnu", None).await.unwrap();

        assert!(matches!(
            repo.repay(&customer.id, Money::zero(), None).await,
            Err(DbError::Rule(_))
        ));
        assert!(matches!(
            repo.repay("nobody", Money::from_rupees(10), None).await,
            Err(DbError::NotFound { .. })
        ));
        assert_eq!(repo.balance(&customer.id).await.unwrap(), Money::zero());
    }
}

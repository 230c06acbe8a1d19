//! `pasal khata` - customers and their credit ledger.
//!
//! Customers are addressed by id or by phone number wherever a command takes
//! a `<CUSTOMER>` argument.

use serde::Serialize;
use tracing::info;

use super::{money, print_json};
use crate::config::PasalConfig;
use crate::error::{CliError, CliResult};
use pasal_core::validation::{validate_name, validate_phone};
use pasal_core::{CoreError, Customer, KhataEntry, KhataEntryKind, Money};
use pasal_db::Database;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBalance {
    #[serde(flatten)]
    pub customer: Customer,
    pub balance_paisa: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLine {
    #[serde(flatten)]
    pub entry: KhataEntry,
    /// Balance after this entry.
    pub balance_paisa: i64,
}

/// Looks a customer up by id, then by phone number.
pub async fn resolve_customer(db: &Database, key: &str) -> CliResult<Customer> {
    let khata = db.khata();

    if let Some(customer) = khata.get_customer(key).await? {
        return Ok(customer);
    }
    if let Some(customer) = khata.find_by_phone(key.trim()).await? {
        return Ok(customer);
    }

    Err(CliError::not_found("Customer", key))
}

pub async fn add_customer(
    db: &Database,
    name: &str,
    phone: Option<&str>,
    json: bool,
) -> CliResult<()> {
    validate_name("name", name).map_err(CoreError::from)?;
    if let Some(phone) = phone {
        validate_phone(phone).map_err(CoreError::from)?;
    }

    let customer = db.khata().create_customer(name, phone).await?;
    info!(id = %customer.id, "Customer added");

    if json {
        return print_json(&customer);
    }

    println!("Added customer {} ({})", customer.name, customer.id);
    Ok(())
}

pub async fn list(config: &PasalConfig, db: &Database, json: bool) -> CliResult<()> {
    let khata = db.khata();
    let mut rows = Vec::new();

    for customer in khata.list_customers().await? {
        let balance = khata.balance(&customer.id).await?;
        rows.push(CustomerBalance {
            customer,
            balance_paisa: balance.paisa(),
        });
    }

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No customers yet.");
        return Ok(());
    }

    println!("{:<36}  {:<24}{:<14}{:>14}", "ID", "Name", "Phone", "Balance");
    for row in &rows {
        println!(
            "{:<36}  {:<24}{:<14}{:>14}",
            row.customer.id,
            row.customer.name,
            row.customer.phone.as_deref().unwrap_or("-"),
            money(config, Money::from_paisa(row.balance_paisa))
        );
    }
    Ok(())
}

pub async fn balance(config: &PasalConfig, db: &Database, key: &str, json: bool) -> CliResult<()> {
    let customer = resolve_customer(db, key).await?;
    let balance = db.khata().balance(&customer.id).await?;

    if json {
        return print_json(&CustomerBalance {
            customer,
            balance_paisa: balance.paisa(),
        });
    }

    println!("{}: {}", customer.name, describe_balance(config, balance));
    Ok(())
}

pub async fn repay(
    config: &PasalConfig,
    db: &Database,
    key: &str,
    amount: Money,
    note: Option<&str>,
    json: bool,
) -> CliResult<()> {
    let customer = resolve_customer(db, key).await?;
    let khata = db.khata();

    let entry = khata.repay(&customer.id, amount, note).await?;
    let balance = khata.balance(&customer.id).await?;

    if json {
        return print_json(&StatementLine {
            entry,
            balance_paisa: balance.paisa(),
        });
    }

    println!(
        "Received {} from {}. {}",
        money(config, amount),
        customer.name,
        describe_balance(config, balance)
    );
    Ok(())
}

pub async fn statement(config: &PasalConfig, db: &Database, key: &str, json: bool) -> CliResult<()> {
    let customer = resolve_customer(db, key).await?;
    let lines = statement_lines(db.khata().entries_for(&customer.id).await?);

    if json {
        return print_json(&lines);
    }

    println!("Khata: {}", customer.name);
    println!("{:<17}{:<32}{:>14}{:>14}", "Date", "Entry", "Amount", "Balance");
    for line in &lines {
        let label = match line.entry.kind {
            KhataEntryKind::Credit => "Credit",
            KhataEntryKind::Repayment => "Repayment",
        };
        let text = match &line.entry.note {
            Some(note) => format!("{label}: {note}"),
            None => label.to_string(),
        };
        println!(
            "{:<17}{:<32}{:>14}{:>14}",
            line.entry
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            text,
            money(config, line.entry.signed_amount()),
            money(config, Money::from_paisa(line.balance_paisa))
        );
    }
    let closing = lines.last().map(|l| l.balance_paisa).unwrap_or(0);
    println!("{}", describe_balance(config, Money::from_paisa(closing)));
    Ok(())
}

/// Pairs each entry with the running balance after it.
pub fn statement_lines(entries: Vec<KhataEntry>) -> Vec<StatementLine> {
    let mut running = Money::zero();
    entries
        .into_iter()
        .map(|entry| {
            running += entry.signed_amount();
            StatementLine {
                entry,
                balance_paisa: running.paisa(),
            }
        })
        .collect()
}

fn describe_balance(config: &PasalConfig, balance: Money) -> String {
    if balance.is_positive() {
        format!("owes {}", money(config, balance))
    } else if balance.is_negative() {
        format!("advance of {}", money(config, balance.abs()))
    } else {
        "settled".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_config;
    use chrono::Utc;
    use pasal_db::DbConfig;

    fn entry(kind: KhataEntryKind, rupees: i64) -> KhataEntry {
        KhataEntry {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: "c1".to_string(),
            kind,
            amount_paisa: rupees * 100,
            sale_id: None,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_statement_running_balance() {
        let lines = statement_lines(vec![
            entry(KhataEntryKind::Credit, 500),
            entry(KhataEntryKind::Credit, 250),
            entry(KhataEntryKind::Repayment, 600),
            entry(KhataEntryKind::Repayment, 200),
        ]);

        let balances: Vec<i64> = lines.iter().map(|l| l.balance_paisa).collect();
        assert_eq!(balances, vec![50_000, 75_000, 15_000, -5_000]);
    }

    #[test]
    fn test_describe_balance() {
        let config = test_config();
        assert_eq!(describe_balance(&config, Money::from_rupees(120)), "owes Rs. 120.00");
        assert_eq!(describe_balance(&config, Money::from_rupees(-50)), "advance of Rs. 50.00");
        assert_eq!(describe_balance(&config, Money::zero()), "settled");
    }

    #[tokio::test]
    async fn test_resolve_customer_by_id_or_phone() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ram = db
            .khata()
            .create_customer("Ram Bahadur", Some("9841000001"))
            .await
            .unwrap();

        assert_eq!(resolve_customer(&db, &ram.id).await.unwrap().id, ram.id);
        assert_eq!(resolve_customer(&db, "9841000001").await.unwrap().id, ram.id);
        assert!(matches!(
            resolve_customer(&db, "9800000000").await,
            Err(CliError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_customer_validates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(matches!(
            add_customer(&db, "  ", None, true).await,
            Err(CliError::Core(CoreError::Validation(_)))
        ));
        assert!(matches!(
            add_customer(&db, "Sita", Some("12345"), true).await,
            Err(CliError::Core(CoreError::Validation(_)))
        ));
        assert!(db.khata().list_customers().await.unwrap().is_empty());
    }
}

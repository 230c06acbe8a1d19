//! CLI command implementations.
//!
//! Each submodule exposes `execute`-style functions taking the loaded
//! [`PasalConfig`] and, where storage is needed, an open [`Database`].

pub mod khata;
pub mod price;
pub mod product;
pub mod report;
pub mod sale;

use serde::Serialize;
use tracing::debug;

use crate::config::PasalConfig;
use crate::error::CliResult;
use pasal_core::Money;
use pasal_db::{Database, DbConfig};

/// Opens (and migrates) the configured database, creating its directory if
/// needed.
pub async fn open_database(config: &PasalConfig) -> CliResult<Database> {
    if let Some(parent) = config.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_config = if config.db_path.as_os_str() == ":memory:" {
        DbConfig::in_memory()
    } else {
        DbConfig::new(&config.db_path)
    };

    debug!(path = %config.db_path.display(), "Opening database");
    Ok(Database::new(db_config).await?)
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn show_config(config: &PasalConfig, json: bool) -> CliResult<()> {
    if json {
        return print_json(config);
    }

    println!("Store:     {}", config.store_name);
    println!("Database:  {}", config.db_path.display());
    println!("VAT:       {}%", config.vat_rate.percentage());
    println!("Currency:  {} ({})", config.currency_code, config.currency_symbol);
    println!("Device:    {}", config.device_id);
    Ok(())
}

/// Parses a rupee amount as typed by an operator: `150`, `150.5`, `150.50`.
///
/// At most two decimal places; negative amounts are rejected. Used as a
/// clap value parser.
pub fn parse_rupees(input: &str) -> Result<Money, String> {
    let input = input.trim();
    let invalid = || format!("'{input}' is not a rupee amount (e.g. 150 or 150.50)");

    let (whole, frac) = match input.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (input, ""),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let rupees: i64 = whole.parse().map_err(|_| invalid())?;
    let paisa: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
        _ => frac.parse().map_err(|_| invalid())?,
    };

    rupees
        .checked_mul(100)
        .and_then(|p| p.checked_add(paisa))
        .map(Money::from_paisa)
        .ok_or_else(invalid)
}

/// Formats money with the configured currency symbol.
pub fn money(config: &PasalConfig, amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    let abs = amount.abs();
    format!(
        "{}{} {}.{:02}",
        sign,
        config.currency_symbol,
        abs.rupees(),
        abs.paisa_part()
    )
}

#[cfg(test)]
pub(crate) fn test_config() -> PasalConfig {
    PasalConfig::from_lookup(|key| match key {
        "PASAL_DB_PATH" => Some(":memory:".to_string()),
        _ => None,
    })
    .unwrap_or_else(|e| panic!("test config: {e}"))
}

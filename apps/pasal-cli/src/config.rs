//! # Configuration
//!
//! Loaded once at startup from `PASAL_*` environment variables, with
//! defaults suitable for a single counter.
//!
//! | Variable                | Default                              |
//! |-------------------------|--------------------------------------|
//! | `PASAL_DB_PATH`         | `<platform data dir>/pasal.db`       |
//! | `PASAL_VAT_BPS`         | `1300` (13%)                         |
//! | `PASAL_STORE_NAME`      | `Pasal`                              |
//! | `PASAL_CURRENCY`        | `NPR`                                |
//! | `PASAL_CURRENCY_SYMBOL` | `Rs.`                                |
//! | `PASAL_DEVICE_ID`       | `counter-01`                         |
//!
//! Read-only after load.

use directories::ProjectDirs;
use serde::Serialize;
use std::env;
use std::path::PathBuf;

use pasal_core::validation::validate_tax_rate_bps;
use pasal_core::{TaxRate, NEPAL_VAT_RATE};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasalConfig {
    /// SQLite file; its directory is created on first use.
    pub db_path: PathBuf,

    /// VAT rate reversed out of every bill.
    pub vat_rate: TaxRate,

    /// Printed at the top of receipts.
    pub store_name: String,

    /// ISO 4217 code.
    pub currency_code: String,

    pub currency_symbol: String,

    /// Identifies this counter in receipt numbers (last two characters).
    pub device_id: String,
}

impl PasalConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup`, which returns the value of a
    /// variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("PASAL_DB_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_db_path(),
        };

        let vat_rate = match lookup("PASAL_VAT_BPS") {
            Some(raw) => {
                let bps: u32 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("PASAL_VAT_BPS".to_string()))?;
                validate_tax_rate_bps(bps)
                    .map_err(|_| ConfigError::InvalidValue("PASAL_VAT_BPS".to_string()))?;
                TaxRate::from_bps(bps)
            }
            None => NEPAL_VAT_RATE,
        };

        let device_id = lookup("PASAL_DEVICE_ID").unwrap_or_else(|| "counter-01".to_string());
        if device_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("PASAL_DEVICE_ID".to_string()));
        }

        Ok(PasalConfig {
            db_path,
            vat_rate,
            store_name: lookup("PASAL_STORE_NAME").unwrap_or_else(|| "Pasal".to_string()),
            currency_code: lookup("PASAL_CURRENCY").unwrap_or_else(|| "NPR".to_string()),
            currency_symbol: lookup("PASAL_CURRENCY_SYMBOL").unwrap_or_else(|| "Rs.".to_string()),
            device_id,
        })
    }
}

/// Platform data directory:
/// - **Linux**: `~/.local/share/pasal-pos/pasal.db`
/// - **macOS**: `~/Library/Application Support/com.pasal.pos/pasal.db`
/// - **Windows**: `%APPDATA%\pasal\pos\data\pasal.db`
///
/// Falls back to the working directory when no home directory is known.
fn default_db_path() -> PathBuf {
    ProjectDirs::from("com", "pasal", "pos")
        .map(|dirs| dirs.data_dir().join("pasal.db"))
        .unwrap_or_else(|| PathBuf::from("pasal.db"))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

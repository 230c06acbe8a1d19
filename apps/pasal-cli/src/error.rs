//! # CLI Error Type
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  command (Result<T, CliError>)                                          │
//! │       │                                                                 │
//! │       ├── CoreError   (cart rules, checkout rules)                      │
//! │       ├── DbError     (storage, constraint violations)                  │
//! │       ├── ConfigError (bad PASAL_* value)                               │
//! │       └── io / serde_json (cart files)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  main: anyhow::Error ──► "error[INSUFFICIENT_STOCK]: ..." on stderr     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use pasal_core::CoreError;
use pasal_db::DbError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cart file: {0}")]
    CartFile(#[from] serde_json::Error),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("{0}")]
    InvalidInput(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    DatabaseError,
    BusinessLogic,
    CartError,
    InsufficientStock,
    PaymentError,
    ConfigError,
    IoError,
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::CartError => "CART_ERROR",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::PaymentError => "PAYMENT_ERROR",
            ErrorCode::ConfigError => "CONFIG_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CliError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        CliError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CliError::Core(err) => core_code(err),
            CliError::Db(err) => db_code(err),
            CliError::Config(_) => ErrorCode::ConfigError,
            CliError::Io(_) => ErrorCode::IoError,
            CliError::CartFile(_) => ErrorCode::ValidationError,
            CliError::NotFound { .. } => ErrorCode::NotFound,
            CliError::InvalidInput(_) => ErrorCode::ValidationError,
        }
    }
}

fn core_code(err: &CoreError) -> ErrorCode {
    match err {
        CoreError::ProductNotFound(_) => ErrorCode::NotFound,
        CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
        CoreError::ProductInactive { .. }
        | CoreError::VariantMismatch { .. }
        | CoreError::LineNotFound { .. }
        | CoreError::CartTooLarge { .. }
        | CoreError::EmptyCart => ErrorCode::CartError,
        CoreError::QuantityTooLarge { .. } | CoreError::Validation(_) => {
            ErrorCode::ValidationError
        }
        CoreError::CustomerRequired { .. } | CoreError::InsufficientTender { .. } => {
            ErrorCode::PaymentError
        }
        CoreError::SaleAlreadyVoided(_) => ErrorCode::BusinessLogic,
    }
}

fn db_code(err: &DbError) -> ErrorCode {
    match err {
        DbError::NotFound { .. } => ErrorCode::NotFound,
        DbError::UniqueViolation { .. }
        | DbError::ForeignKeyViolation { .. }
        | DbError::CheckViolation { .. } => ErrorCode::ValidationError,
        DbError::Rule(core) => core_code(core),
        DbError::ConnectionFailed(_)
        | DbError::MigrationFailed(_)
        | DbError::QueryFailed(_)
        | DbError::PoolExhausted => ErrorCode::DatabaseError,
        DbError::Internal(_) => ErrorCode::Internal,
    }
}

/// Finds the most specific code in an error chain.
pub fn code_for(err: &anyhow::Error) -> ErrorCode {
    err.chain()
        .find_map(|e| e.downcast_ref::<CliError>())
        .map(CliError::code)
        .unwrap_or(ErrorCode::Internal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pasal_core::{Money, ValidationError};

    #[test]
    fn test_codes_follow_the_cause() {
        let stock: CliError = DbError::Rule(CoreError::InsufficientStock {
            sku: "DAHI".to_string(),
            available: 1,
            requested: 2,
        })
        .into();
        assert_eq!(stock.code(), ErrorCode::InsufficientStock);

        let tender: CliError = CoreError::InsufficientTender {
            due: Money::from_rupees(180),
            tendered: Money::from_rupees(100),
        }
        .into();
        assert_eq!(tender.code(), ErrorCode::PaymentError);

        let dup: CliError = DbError::duplicate("sku", "CHIYA").into();
        assert_eq!(dup.code(), ErrorCode::ValidationError);

        let validation: CliError = CoreError::from(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(validation.code(), ErrorCode::ValidationError);

        assert_eq!(CliError::not_found("Sale", "x").code(), ErrorCode::NotFound);
    }

    #[test]
    fn test_code_for_anyhow_chain() {
        let err = anyhow::Error::new(CliError::not_found("Customer", "42"))
            .context("Failed to show khata");
        assert_eq!(code_for(&err), ErrorCode::NotFound);

        let plain = anyhow::anyhow!("something else");
        assert_eq!(code_for(&plain), ErrorCode::Internal);
    }

    #[test]
    fn test_code_display_matches_serde() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, format!("\"{}\"", ErrorCode::InsufficientStock));
    }
}

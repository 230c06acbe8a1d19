//! # Error Types
//!
//! Domain-specific error types for pasal-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pasal-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  pasal-db errors                                                        │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  pasal-cli errors                                                       │
//! │  └── CliError         - What the operator sees (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pricing engine itself never fails; these errors come from cart
//! mutations and checkout rules.

use thiserror::Error;

use crate::money::Money;

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product was soft-deleted or disabled.
    #[error("Product {sku} is not available for sale")]
    ProductInactive { sku: String },

    /// Insufficient stock to complete sale.
    ///
    /// ## When This Occurs
    /// - Product has `track_inventory = true`
    /// - Requested quantity exceeds `current_stock`
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// Variant does not belong to the product on the line.
    #[error("Variant {variant_id} does not belong to product {product_id}")]
    VariantMismatch {
        variant_id: String,
        product_id: String,
    },

    #[error("No cart line at position {index}")]
    LineNotFound { index: usize },

    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    #[error("Cart is empty")]
    EmptyCart,

    /// Khata sale attempted without a customer.
    #[error("Payment method {method} requires a customer")]
    CustomerRequired { method: String },

    /// Cash tendered is less than the amount due.
    #[error("Tendered {tendered} is less than amount due {due}")]
    InsufficientTender { due: Money, tendered: Money },

    #[error("Sale {0} is already voided")]
    SaleAlreadyVoided(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "WAIWAI-75G".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for WAIWAI-75G: available 3, requested 5"
        );

        let err = CoreError::InsufficientTender {
            due: Money::from_rupees(180),
            tendered: Money::from_rupees(100),
        };
        assert_eq!(
            err.to_string(),
            "Tendered Rs. 100.00 is less than amount due Rs. 180.00"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(validation_err.to_string(), "sku is required");

        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

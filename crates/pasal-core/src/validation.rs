//! # Validation Module
//!
//! Input sanitisation and validation for Pasal POS.
//!
//! ## Two Kinds of Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Sanitisers (sanitize_*)                                                │
//! │  ├── Used on cart input typed by the cashier                            │
//! │  ├── Never fail: clamp to the nearest valid value                       │
//! │  └── quantity ≥ 1, discount ≥ 0, percentage ≤ 100%                      │
//! │                                                                         │
//! │  Validators (validate_*)                                                │
//! │  ├── Used on master data and payments                                   │
//! │  └── Return ValidationError                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ```rust
//! use pasal_core::validation::{sanitize_quantity, validate_sku};
//!
//! assert_eq!(sanitize_quantity(-4), 1);
//! assert!(validate_sku("WAIWAI-75G").is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Discount;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_PAISA};

pub type ValidationResult<T> = Result<T, ValidationError>;

/// 100% in basis points.
pub const MAX_PERCENTAGE_BPS: u32 = 10_000;

// =============================================================================
// Sanitisers
// =============================================================================

/// Clamps a typed quantity to `1..=MAX_ITEM_QUANTITY`.
pub fn sanitize_quantity(qty: i64) -> i64 {
    qty.clamp(1, MAX_ITEM_QUANTITY)
}

/// Clamps a unit price to `0..=MAX_UNIT_PRICE_PAISA`.
pub fn sanitize_unit_price(price: Money) -> Money {
    Money::from_paisa(price.paisa().clamp(0, MAX_UNIT_PRICE_PAISA))
}

/// Clamps a discount into its valid range.
///
/// - Negative fixed amounts become zero
/// - Percentages above 100% become 100%
/// - Zero-valued discounts collapse to `Discount::None`
///
/// ```rust
/// use pasal_core::validation::sanitize_discount;
/// use pasal_core::{Discount, Money};
///
/// assert_eq!(sanitize_discount(Discount::Percentage(15_000)), Discount::Percentage(10_000));
/// assert_eq!(sanitize_discount(Discount::Fixed(Money::from_paisa(-5))), Discount::None);
/// ```
pub fn sanitize_discount(discount: Discount) -> Discount {
    let clamped = match discount {
        Discount::None => Discount::None,
        Discount::Percentage(bps) => Discount::Percentage(bps.min(MAX_PERCENTAGE_BPS)),
        Discount::Fixed(amount) => Discount::Fixed(amount.non_negative()),
    };
    if clamped.is_none() {
        Discount::None
    } else {
        clamped
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU: 1-50 chars of letters, digits, hyphen, underscore.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a display name (products, customers). Devanagari is fine.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a Nepali phone number: 10 digits, optionally prefixed `+977`.
///
/// ```rust
/// use pasal_core::validation::validate_phone;
///
/// assert!(validate_phone("9841234567").is_ok());
/// assert!(validate_phone("+977 9801234567").is_ok());
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits: String = phone
        .trim()
        .trim_start_matches("+977")
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.len() != 10 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a 10 digit number".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price: `0..=MAX_UNIT_PRICE_PAISA`. Zero is allowed (free items).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.paisa() > MAX_UNIT_PRICE_PAISA {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_PAISA,
        });
    }

    Ok(())
}

/// Validates a payment or repayment amount: must be positive.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > MAX_PERCENTAGE_BPS {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: MAX_PERCENTAGE_BPS as i64,
        });
    }

    Ok(())
}

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_quantity() {
        assert_eq!(sanitize_quantity(0), 1);
        assert_eq!(sanitize_quantity(-10), 1);
        assert_eq!(sanitize_quantity(7), 7);
        assert_eq!(sanitize_quantity(5_000), MAX_ITEM_QUANTITY);
    }

    #[test]
    fn test_sanitize_unit_price() {
        assert_eq!(sanitize_unit_price(Money::from_paisa(-10_000)), Money::zero());
        assert_eq!(sanitize_unit_price(Money::from_rupees(25)), Money::from_rupees(25));
        assert_eq!(
            sanitize_unit_price(Money::from_paisa(i64::MAX)),
            Money::from_paisa(MAX_UNIT_PRICE_PAISA)
        );
    }

    #[test]
    fn test_sanitize_discount() {
        assert_eq!(sanitize_discount(Discount::percent(10)), Discount::percent(10));
        assert_eq!(sanitize_discount(Discount::percent(250)), Discount::percent(100));
        assert_eq!(sanitize_discount(Discount::Percentage(0)), Discount::None);
        assert_eq!(sanitize_discount(Discount::rupees(-20)), Discount::None);
        assert_eq!(sanitize_discount(Discount::rupees(20)), Discount::rupees(20));
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("WAIWAI-75G").is_ok());
        assert!(validate_sku("momo_chicken").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "चिया").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"क".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_paisa(-1)).is_err());
        assert!(validate_price(Money::from_paisa(MAX_UNIT_PRICE_PAISA)).is_ok());
        assert!(validate_price(Money::from_paisa(MAX_UNIT_PRICE_PAISA + 1)).is_err());
        assert!(validate_payment_amount(Money::from_paisa(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
        assert!(validate_tax_rate_bps(1300).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_ITEMS).is_err());
    }
}

//! Validation utilities for the Dukani inventory ledger
//!
//! Includes Tanzania-specific phone number validation for worker identities.

use rust_decimal::Decimal;

use crate::types::QuantityType;

// ============================================================================
// Ledger Quantity Validations
// ============================================================================

/// Check whether a decimal quantity has no fractional part.
///
/// This is a strict whole-number check (`quantity mod 1 == 0`), not rounding:
/// `10.000` passes, `10.001` does not.
pub fn is_whole_number(quantity: Decimal) -> bool {
    quantity.fract().is_zero()
}

/// Validate a ledger quantity (stock, sale, or missed-sale request).
///
/// Quantities must be strictly positive, and whole numbers for UNIT-counted
/// products.
pub fn validate_quantity(quantity: Decimal, quantity_type: QuantityType) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    if quantity_type == QuantityType::Unit && !is_whole_number(quantity) {
        return Err("Quantity must be a whole number for UNIT type products");
    }
    Ok(())
}

/// Validate a money value (prices are non-negative, 2 decimal places)
pub fn validate_money(amount: Decimal) -> Result<(), &'static str> {
    if amount < Decimal::ZERO {
        return Err("Amount cannot be negative");
    }
    if amount.scale() > 2 {
        return Err("Amount cannot have more than 2 decimal places");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

/// Validate a worker invite code (8 uppercase alphanumeric characters)
pub fn validate_invite_code(code: &str) -> Result<(), &'static str> {
    if code.len() != 8 {
        return Err("Invite code must be 8 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err("Invite code must be uppercase alphanumeric only");
    }
    Ok(())
}

/// Validate a product barcode (non-empty, at most 100 characters)
pub fn validate_barcode(barcode: &str) -> Result<(), &'static str> {
    if barcode.is_empty() {
        return Err("Barcode cannot be empty");
    }
    if barcode.len() > 100 {
        return Err("Barcode must be at most 100 characters");
    }
    Ok(())
}

// ============================================================================
// Tanzania-Specific Validations
// ============================================================================

/// Validate Tanzanian phone number format
/// Accepts: 0712345678, 0712-345-678, +255712345678, 712345678
pub fn validate_tz_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    // Local mobile: 10 digits starting with 0 (e.g., 0712345678)
    if digits.len() == 10 && digits.starts_with('0') {
        return Ok(());
    }
    // Without leading 0: 9 digits (e.g., 712345678)
    if digits.len() == 9 && !digits.starts_with('0') {
        return Ok(());
    }
    // International format with country code: 12 digits starting with 255
    if digits.len() == 12 && digits.starts_with("255") {
        return Ok(());
    }

    Err("Invalid Tanzanian phone number format")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    // ========================================================================
    // Quantity Validation Tests
    // ========================================================================

    #[test]
    fn test_whole_number_check() {
        assert!(is_whole_number(dec("10")));
        assert!(is_whole_number(dec("10.000")));
        assert!(is_whole_number(dec("0")));
        assert!(!is_whole_number(dec("10.001")));
        assert!(!is_whole_number(dec("0.5")));
    }

    #[test]
    fn test_validate_quantity_unit() {
        assert!(validate_quantity(dec("10"), QuantityType::Unit).is_ok());
        assert!(validate_quantity(dec("10.000"), QuantityType::Unit).is_ok());
        assert!(validate_quantity(dec("10.5"), QuantityType::Unit).is_err());
        assert!(validate_quantity(dec("0.001"), QuantityType::Unit).is_err());
    }

    #[test]
    fn test_validate_quantity_weight_volume() {
        assert!(validate_quantity(dec("10.5"), QuantityType::WeightVolume).is_ok());
        assert!(validate_quantity(dec("0.001"), QuantityType::WeightVolume).is_ok());
    }

    #[test]
    fn test_validate_quantity_rejects_non_positive() {
        assert!(validate_quantity(dec("0"), QuantityType::Unit).is_err());
        assert!(validate_quantity(dec("-1"), QuantityType::Unit).is_err());
        assert!(validate_quantity(dec("0.000"), QuantityType::WeightVolume).is_err());
        assert!(validate_quantity(dec("-0.5"), QuantityType::WeightVolume).is_err());
    }

    #[test]
    fn test_validate_money() {
        assert!(validate_money(dec("0")).is_ok());
        assert!(validate_money(dec("1500.50")).is_ok());
        assert!(validate_money(dec("-0.01")).is_err());
        assert!(validate_money(dec("1.001")).is_err());
    }

    // ========================================================================
    // General Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@duka.co.tz").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("no@domain").is_err());
        assert!(validate_email("@.").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("password123").is_ok());
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_invite_code() {
        assert!(validate_invite_code("A1B2C3D4").is_ok());
        assert!(validate_invite_code("ABCDEFGH").is_ok());
        assert!(validate_invite_code("A1B2C3").is_err()); // Too short
        assert!(validate_invite_code("a1b2c3d4").is_err()); // Lowercase
        assert!(validate_invite_code("A1B2C3D!").is_err()); // Special char
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("6161100112237").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode(&"9".repeat(101)).is_err());
    }

    // ========================================================================
    // Tanzania-Specific Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_tz_phone_valid() {
        // Standard local mobile
        assert!(validate_tz_phone("0712345678").is_ok());
        // With dashes
        assert!(validate_tz_phone("0712-345-678").is_ok());
        // Without leading zero
        assert!(validate_tz_phone("712345678").is_ok());
        // International format
        assert!(validate_tz_phone("+255712345678").is_ok());
        assert!(validate_tz_phone("255712345678").is_ok());
    }

    #[test]
    fn test_validate_tz_phone_invalid() {
        assert!(validate_tz_phone("12345").is_err());
        assert!(validate_tz_phone("1234567890123").is_err());
        assert!(validate_tz_phone("abcdefghij").is_err());
    }

    // ========================================================================
    // Property-Based Tests
    // ========================================================================

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any integral decimal passes the whole-number check regardless
            /// of trailing-zero scale
            #[test]
            fn prop_integral_is_whole(n in 0i64..1_000_000, scale in 0u32..4) {
                let value = Decimal::new(n * 10i64.pow(scale), scale);
                prop_assert!(is_whole_number(value));
            }

            /// A quantity with a nonzero fractional part never validates as UNIT
            #[test]
            fn prop_fractional_fails_unit(whole in 0i64..1_000_000, frac in 1i64..1000) {
                let value = Decimal::new(whole * 1000 + frac, 3);
                prop_assert!(validate_quantity(value, QuantityType::Unit).is_err());
            }

            /// Positive quantities always validate for weight/volume products
            #[test]
            fn prop_positive_ok_for_weight_volume(n in 1i64..10_000_000) {
                let value = Decimal::new(n, 3);
                prop_assert!(validate_quantity(value, QuantityType::WeightVolume).is_ok());
            }
        }
    }
}

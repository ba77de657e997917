//! Validation helpers for recorder inputs
//!
//! All checks run before any store interaction; a rejected input never
//! produces a partial write.

use rust_decimal::Decimal;

/// Validate a movement or loading quantity (strictly positive; the entry
/// direction carries the sign)
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a contract number (non-empty, no whitespace, bounded length)
pub fn validate_contract_no(contract_no: &str) -> Result<(), &'static str> {
    if contract_no.trim().is_empty() {
        return Err("Contract number is required");
    }
    if contract_no.len() > 32 {
        return Err("Contract number must be at most 32 characters");
    }
    if contract_no.chars().any(|c| c.is_whitespace()) {
        return Err("Contract number must not contain whitespace");
    }
    Ok(())
}

/// Validate a free-form description for a manual ledger entry
pub fn validate_description(description: &str) -> Result<(), &'static str> {
    if description.trim().is_empty() {
        return Err("Description is required");
    }
    if description.len() > 255 {
        return Err("Description must be at most 255 characters");
    }
    Ok(())
}

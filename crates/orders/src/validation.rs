//! Write-time constraints on a custom order.

use printshop_core::{DomainError, DomainResult};

pub const MAX_CUSTOM_TEXT_CHARS: usize = 50;

pub const QUANTITY_NOT_POSITIVE: &str = "Quantity must be greater than 0!";
pub const CUSTOM_TEXT_TOO_LONG: &str = "Custom text cannot exceed 50 characters!";

pub fn check_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation(QUANTITY_NOT_POSITIVE));
    }
    Ok(())
}

/// Length is counted in characters, not bytes.
pub fn check_custom_text(custom_text: Option<&str>) -> DomainResult<()> {
    match custom_text {
        Some(text) if text.chars().count() > MAX_CUSTOM_TEXT_CHARS => {
            Err(DomainError::validation(CUSTOM_TEXT_TOO_LONG))
        }
        _ => Ok(()),
    }
}

/// Run every constraint; the first failure wins (quantity, then text).
pub fn check_fields(quantity: i64, custom_text: Option<&str>) -> DomainResult<()> {
    check_quantity(quantity)?;
    check_custom_text(custom_text)
}

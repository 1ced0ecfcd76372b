//! Derived prices of a custom order.
//!
//! Both computations are pure. The order aggregate calls them from its write
//! path whenever one of their inputs changes; nothing is recomputed lazily.

use printshop_core::{DomainError, DomainResult, Money};

use crate::options::{DesignFile, Size};

/// Surcharge for a non-empty custom text.
pub const CUSTOM_TEXT_FEE: Money = Money::from_minor(500);

/// Surcharge for an uploaded design file.
pub const DESIGN_FILE_FEE: Money = Money::from_minor(1000);

/// Size surcharge by size code. Unknown codes are free.
pub fn size_surcharge(code: &str) -> Money {
    match code {
        "small" => Money::ZERO,
        "medium" => Money::from_minor(500),
        "large" => Money::from_minor(1000),
        "xlarge" => Money::from_minor(1500),
        _ => Money::ZERO,
    }
}

impl Size {
    pub fn surcharge(self) -> Money {
        size_surcharge(self.code())
    }
}

/// Customization fee: text fee + design fee + size surcharge.
pub fn customization_fee(
    custom_text: Option<&str>,
    design_file: Option<&DesignFile>,
    size: Size,
) -> Money {
    let mut fee = Money::ZERO;

    if custom_text.is_some_and(|t| !t.is_empty()) {
        fee = fee + CUSTOM_TEXT_FEE;
    }

    if design_file.is_some_and(DesignFile::is_present) {
        fee = fee + DESIGN_FILE_FEE;
    }

    fee + size.surcharge()
}

/// `(base_price + customization_fee) * quantity`.
pub fn total_price(base_price: Money, customization_fee: Money, quantity: i64) -> DomainResult<Money> {
    base_price
        .checked_add(customization_fee)
        .and_then(|unit| unit.checked_mul(quantity))
        .ok_or_else(|| DomainError::invariant("total price overflow"))
}

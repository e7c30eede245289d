pub mod auth;
pub mod categories;
pub mod orders;
pub mod products;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use validator::ValidationError;

/// Letters, digits, hyphens and underscores.
pub static SLUG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());

/// Largest magnitude a `NUMERIC(10, 2)` column holds, exclusive.
const MONEY_LIMIT: i64 = 100_000_000;

/// Non-negative amount with at most 8 integer digits and 2 decimal places.
pub fn validate_money(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("negative_amount"));
    }
    if value.normalize().scale() > 2 {
        return Err(ValidationError::new("max_decimal_places"));
    }
    if *value >= Decimal::from(MONEY_LIMIT) {
        return Err(ValidationError::new("max_digits"));
    }
    Ok(())
}

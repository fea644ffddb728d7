//! # Monetary Formatting
//!
//! All amounts are `rust_decimal::Decimal`. Rendering is string formatting
//! over the decimal value, never float or locale formatting.
//!
//! | field kind | rendering |
//! |---|---|
//! | money | exactly two fractional digits, half away from zero |
//! | unit price | exactly six fractional digits |
//! | rate / percentage | plain number, trailing zeros dropped |
//! | quantity | plain number, trailing zeros dropped |

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to cents, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount with exactly two fractional digits.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_cents(value))
}

/// Render a unit price with exactly six fractional digits.
pub fn format_unit_price(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(6, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.6}", rounded)
}

/// Render a percentage as a plain number: `12`, `2.75`, `0`.
pub fn format_rate(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Render a quantity as a plain number.
pub fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Whether the value carries no significant digits below the cent.
pub fn fits_cents(value: Decimal) -> bool {
    value.normalize().scale() <= 2
}

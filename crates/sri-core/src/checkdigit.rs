//! # Check-Digit Engine
//!
//! The two checksum families used by the tax authority's identifiers and
//! access keys.
//!
//! - [`mod10`]: weighted "double-and-reduce". Each product of ten or more
//!   is reduced by nine before summing.
//! - [`mod11`]: weighted modulo 11. The mapping from remainder to digit is
//!   an explicit [`Mod11Remap`] argument because different use sites apply
//!   different tables.
//!
//! Weights cycle when the digit sequence is longer than the weight vector.
//! [`Direction`] states which end of the sequence the first weight applies to.
//!
//! Both functions are pure and total over their inputs.

use serde::{Deserialize, Serialize};

/// Cyclic weights applied right-to-left over the 48-digit access-key body.
pub const ACCESS_KEY_WEIGHTS: [u8; 6] = [2, 3, 4, 5, 6, 7];

/// Which end of the digit sequence receives the first weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The first weight multiplies the first (leftmost) digit.
    LeftToRight,
    /// The first weight multiplies the last (rightmost) digit.
    RightToLeft,
}

/// Mapping from a modulo-11 remainder to the emitted check value.
///
/// Both tables map remainder 0 to 0 and any other remainder `r` to `11 - r`.
/// They differ only in how they treat the value 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mod11Remap {
    /// `11 - r`, with `r == 0` mapped to 0. A remainder of 1 yields 10,
    /// which is not a single digit; callers must treat it as a failure.
    Standard,
    /// As `Standard`, additionally folding 10 to 1. Always yields a digit.
    Extended,
}

impl Mod11Remap {
    /// Map a remainder in `0..11` to the check value under this table.
    pub fn apply(self, remainder: u32) -> u8 {
        let raw = if remainder == 0 { 0 } else { 11 - remainder };
        match (self, raw) {
            (Self::Extended, 10) => 1,
            // 11 cannot occur after the r == 0 branch; kept for the table's
            // published shape.
            (Self::Extended, 11) => 0,
            _ => raw as u8,
        }
    }
}

impl std::fmt::Display for Mod11Remap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Extended => f.write_str("extended"),
        }
    }
}

/// Weighted sum of `digits` with cyclic `weights`, where `term` post-processes
/// each product.
fn weighted_sum(digits: &[u8], weights: &[u8], direction: Direction, term: fn(u32) -> u32) -> u32 {
    if weights.is_empty() {
        return 0;
    }
    let product = |(i, d): (usize, &u8)| term(u32::from(*d) * u32::from(weights[i % weights.len()]));
    match direction {
        Direction::LeftToRight => digits.iter().enumerate().map(product).sum(),
        Direction::RightToLeft => digits.iter().rev().enumerate().map(product).sum(),
    }
}

/// Modulo-10 check digit.
///
/// Products of ten or more are reduced by nine (the sum of their own digits
/// for single-digit weights). The check digit is `(10 - sum % 10) % 10`.
pub fn mod10(digits: &[u8], weights: &[u8], direction: Direction) -> u8 {
    let sum = weighted_sum(digits, weights, direction, |p| if p >= 10 { p - 9 } else { p });
    ((10 - sum % 10) % 10) as u8
}

/// Modulo-11 check value under the given remap table.
///
/// Under [`Mod11Remap::Standard`] the result is in `0..=10`; under
/// [`Mod11Remap::Extended`] it is always a single digit.
pub fn mod11(digits: &[u8], weights: &[u8], direction: Direction, remap: Mod11Remap) -> u8 {
    let sum = weighted_sum(digits, weights, direction, |p| p);
    remap.apply(sum % 11)
}

/// Parse an all-digit string into its digit values.
///
/// Returns `None` if any character is not an ASCII digit.
pub fn parse_digits(s: &str) -> Option<Vec<u8>> {
    s.bytes()
        .map(|b| b.is_ascii_digit().then(|| b - b'0'))
        .collect()
}

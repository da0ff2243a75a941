//! Lenient coercion of form-field text into numbers.
//!
//! Data entry is never blocked: anything that does not start with an integer
//! becomes 0. The accepted syntax is an optional sign followed by digits,
//! after optional leading whitespace; whatever follows the digits is ignored,
//! so `"12abc"` reads as 12 and `"3.7"` as 3.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

static LEADING_INT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?)([0-9]+)").expect("leading integer pattern is valid")
});

/// Reads the leading integer of `text`, saturating at the `i64` range.
///
/// Returns `None` when the text does not start with an integer.
pub fn parse_int_lenient(text: &str) -> Option<i64> {
    let caps = LEADING_INT.captures(text)?;
    let negative = &caps[1] == "-";
    let digits = &caps[2];

    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Quantity fields: missing, invalid or negative input reads as 0.
pub fn coerce_quantity(text: &str) -> u32 {
    match parse_int_lenient(text) {
        Some(value) if value > 0 => u32::try_from(value).unwrap_or(u32::MAX),
        Some(value) => {
            if value < 0 {
                debug!(input = %text, "negative quantity coerced to 0");
            }
            0
        }
        None => {
            if !text.trim().is_empty() {
                debug!(input = %text, "non-numeric quantity coerced to 0");
            }
            0
        }
    }
}

/// Rate fields follow the same rule as quantities.
pub fn coerce_rate(text: &str) -> i64 {
    match parse_int_lenient(text) {
        Some(value) if value >= 0 => value,
        _ => {
            if !text.trim().is_empty() {
                debug!(input = %text, "invalid rate coerced to 0");
            }
            0
        }
    }
}

/// The expense field keeps its sign; only non-numeric text becomes 0.
pub fn coerce_expense(text: &str) -> i64 {
    parse_int_lenient(text).unwrap_or_else(|| {
        if !text.trim().is_empty() {
            debug!(input = %text, "non-numeric expense coerced to 0");
        }
        0
    })
}

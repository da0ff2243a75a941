//! Common helpers shared by the row engine and the aggregate.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Share of line revenue attributed to the secondary operator (0.5).
pub const SECONDARY_SHARE_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

/// Multiplies `amount` by `ratio` and rounds toward negative infinity.
///
/// Half-unit remainders always go down: `apply_ratio_floor(2997, 0.5)` is
/// 1498, never 1499.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use settle_core::calculations::common::apply_ratio_floor;
///
/// assert_eq!(apply_ratio_floor(2997, dec!(0.5)), 1498);
/// assert_eq!(apply_ratio_floor(300, dec!(0.5)), 150);
/// assert_eq!(apply_ratio_floor(-3, dec!(0.5)), -2);
/// ```
pub fn apply_ratio_floor(
    amount: i64,
    ratio: Decimal,
) -> i64 {
    let scaled = (Decimal::from(amount) * ratio).floor();
    scaled.to_i64().unwrap_or(if scaled.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Inserts comma thousands separators: `1234567` → `"1,234,567"`.
///
/// # Examples
///
/// ```
/// use settle_core::calculations::common::format_grouped;
///
/// assert_eq!(format_grouped(0), "0");
/// assert_eq!(format_grouped(1800), "1,800");
/// assert_eq!(format_grouped(-1234567), "-1,234,567");
/// ```
pub fn format_grouped(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// On-screen currency display: `"¥"` followed by the grouped amount.
///
/// Report text never uses this; it prints raw integers.
pub fn format_currency(value: i64) -> String {
    format!("¥{}", format_grouped(value))
}

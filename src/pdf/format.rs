//! Number and name formatting shared by the renderers.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// `$1,234.56`, rounded half-up to cents. Negative values render as `$-1,234.56`.
#[must_use]
pub fn format_currency(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let cents = (rounded.abs() * Decimal::from(100))
        .trunc()
        .to_i128()
        .unwrap_or(0);
    let cents_str = format!("{cents:03}");
    let (whole, frac) = cents_str.split_at(cents_str.len() - 2);

    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    format!("${sign}{}.{frac}", group_thousands(whole))
}

/// Two decimal places without a currency symbol; `None` renders as `-`.
#[must_use]
pub fn format_optional_decimal(value: Option<Decimal>) -> String {
    value.map_or_else(|| "-".to_string(), format_plain_decimal)
}

/// Two decimal places without separators, half-up.
#[must_use]
pub fn format_plain_decimal(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Uppercased surname stripped of everything but letters and digits, for use
/// inside generated filenames. Falls back to `EMPLOYEE`.
#[must_use]
pub fn sanitize_surname(last_name: &str) -> String {
    let cleaned: String = last_name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_uppercase();
    if cleaned.is_empty() {
        "EMPLOYEE".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(999.999)), "$1,000.00");
    }

    #[test]
    fn currency_rounds_half_up() {
        assert_eq!(format_currency(dec!(2.005)), "$2.01");
        assert_eq!(format_currency(dec!(2.004)), "$2.00");
    }

    #[test]
    fn negative_currency() {
        assert_eq!(format_currency(dec!(-1234.5)), "$-1,234.50");
    }

    #[test]
    fn optional_decimal_placeholder() {
        assert_eq!(format_optional_decimal(None), "-");
        assert_eq!(format_optional_decimal(Some(dec!(38.5))), "38.50");
    }

    #[test]
    fn surnames_are_scrubbed() {
        assert_eq!(sanitize_surname("O'Brien"), "OBRIEN");
        assert_eq!(sanitize_surname("de la Cruz"), "DELACRUZ");
        assert_eq!(sanitize_surname("---"), "EMPLOYEE");
    }
}

//! Raw amount conversions
//!
//! The backend speaks raw integer units (`Nat`). Humans speak decimal
//! strings. Conversions here are exact string arithmetic so that 18-decimal
//! tokens never pass through an `f64`.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

use crate::U256;

/// Most fraction digits ever shown to a user
pub const MAX_DISPLAY_DECIMALS: u32 = 8;

/// Parse a human decimal string into raw units.
///
/// Extra fraction digits beyond `decimals` are truncated (round down).
/// Empty, negative or non-numeric input yields zero.
pub fn to_raw(amount: &str, decimals: u8) -> U256 {
    let amount = amount.trim();
    let (whole, frac) = amount.split_once('.').unwrap_or((amount, ""));

    if whole.is_empty() && frac.is_empty() {
        return U256::ZERO;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return U256::ZERO;
    }

    let decimals = decimals as usize;
    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    if frac.len() >= decimals {
        digits.push_str(&frac[..decimals]);
    } else {
        digits.push_str(frac);
        digits.extend(std::iter::repeat('0').take(decimals - frac.len()));
    }

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return U256::ZERO;
    }

    U256::from_str_radix(digits, 10).unwrap_or(U256::ZERO)
}

/// Render raw units as an exact decimal string, trailing zeros trimmed
pub fn from_raw(raw: U256, decimals: u8) -> String {
    let digits = raw.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };

    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Lossy conversion for weighting and display math
pub fn raw_to_f64(raw: U256) -> f64 {
    raw.to_string().parse().unwrap_or(0.0)
}

/// Display formatting: at most `min(decimals, 8)` fraction digits, truncated
pub fn format_amount(amount: &str, decimals: u8) -> String {
    let dp = (decimals as u32).min(MAX_DISPLAY_DECIMALS);
    match Decimal::from_str(amount.trim()) {
        Ok(value) => value
            .round_dp_with_strategy(dp, RoundingStrategy::ToZero)
            .normalize()
            .to_string(),
        Err(_) => amount.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_raw_six_decimals() {
        assert_eq!(to_raw("100", 6), U256::from(100_000_000u64));
        assert_eq!(to_raw("1.5", 6), U256::from(1_500_000u64));
        assert_eq!(to_raw(".25", 2), U256::from(25u64));
    }

    #[test]
    fn test_to_raw_truncates_extra_digits() {
        assert_eq!(to_raw("0.123456789", 6), U256::from(123_456u64));
    }

    #[test]
    fn test_to_raw_rejects_garbage() {
        assert_eq!(to_raw("", 8), U256::ZERO);
        assert_eq!(to_raw("abc", 8), U256::ZERO);
        assert_eq!(to_raw("-1", 8), U256::ZERO);
        assert_eq!(to_raw("1.2.3", 8), U256::ZERO);
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(from_raw(U256::from(150_000_000u64), 8), "1.5");
        assert_eq!(from_raw(U256::from(5u64), 8), "0.00000005");
        assert_eq!(from_raw(U256::ZERO, 8), "0");
        assert_eq!(from_raw(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_eighteen_decimals_stay_exact() {
        let raw = to_raw("1234.000000000000000001", 18);
        assert_eq!(raw.to_string(), "1234000000000000000001");
        assert_eq!(from_raw(raw, 18), "1234.000000000000000001");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount("1.123456789123", 18), "1.12345678");
        assert_eq!(format_amount("2.50", 6), "2.5");
        assert_eq!(format_amount("3.999", 2), "3.99");
        assert_eq!(format_amount("n/a", 8), "n/a");
    }
}

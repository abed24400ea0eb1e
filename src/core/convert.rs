//! Amount conversion between two currencies priced against a common base

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// A settled conversion to perform, created per user edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
    pub source: String,
    pub target: String,
    pub source_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ConversionResult {
    pub target_amount: f64,
}

/// Rounds half away from zero to two decimal places.
///
/// The midpoint is judged on the exact value of the double, so `0.015`
/// (stored just below the midpoint) rounds down. Values too large for a
/// [`Decimal`] are returned unchanged.
pub fn round_cents(value: f64) -> f64 {
    let Some(exact) = Decimal::from_f64_retain(value) else {
        return value;
    };
    let rounded = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    // A single division gives the double nearest to the decimal result
    rounded.mantissa() as f64 / 10f64.powi(rounded.scale() as i32)
}

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Converts `source_amount` using rates expressed against the same base.
///
/// Any missing, zero, negative or non-finite input yields exactly `0.0`.
pub fn convert(
    source_rate: Option<f64>,
    target_rate: Option<f64>,
    source_amount: Option<f64>,
) -> ConversionResult {
    match (usable(source_rate), usable(target_rate), usable(source_amount)) {
        (Some(source_rate), Some(target_rate), Some(amount)) => ConversionResult {
            target_amount: round_cents(amount * target_rate / source_rate),
        },
        _ => ConversionResult::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_basic() {
        assert_eq!(
            convert(Some(2.0), Some(0.5), Some(100.0)).target_amount,
            25.0
        );
        assert_eq!(
            convert(Some(1.0), Some(1.0), Some(42.424)).target_amount,
            42.42
        );
    }

    #[test]
    fn test_convert_missing_inputs_is_zero() {
        assert_eq!(convert(None, Some(1.0), Some(10.0)).target_amount, 0.0);
        assert_eq!(convert(Some(1.0), None, Some(10.0)).target_amount, 0.0);
        assert_eq!(convert(Some(1.0), Some(1.0), None).target_amount, 0.0);
        assert_eq!(convert(Some(0.0), Some(1.0), Some(10.0)).target_amount, 0.0);
        assert_eq!(convert(Some(1.0), Some(1.0), Some(0.0)).target_amount, 0.0);
    }

    #[test]
    fn test_convert_never_negative() {
        assert_eq!(convert(Some(1.0), Some(2.0), Some(-5.0)).target_amount, 0.0);
        assert_eq!(convert(Some(-1.0), Some(2.0), Some(5.0)).target_amount, 0.0);
        assert_eq!(
            convert(Some(f64::NAN), Some(2.0), Some(5.0)).target_amount,
            0.0
        );
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        // 0.125 and 0.375 are exact in binary so the midpoint is really hit
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(0.375), 0.38);
        assert_eq!(round_cents(2.5), 2.5);
        assert_eq!(round_cents(1.004), 1.0);
        // Stored just below the midpoint, so they round down
        assert_eq!(round_cents(0.015), 0.01);
        assert_eq!(round_cents(0.045), 0.04);
        assert_eq!(round_cents(0.155), 0.15);
    }

    #[test]
    fn test_convert_does_not_round_twice() {
        assert_eq!(
            convert(Some(1.0), Some(1.0), Some(0.015)).target_amount,
            0.01
        );
        assert_eq!(
            convert(Some(2.0), Some(2.0), Some(0.045)).target_amount,
            0.04
        );
    }
}

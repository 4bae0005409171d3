//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u32 to f64.
#[must_use]
pub fn u32_to_f64(value: u32) -> f64 {
    f64::from(value)
}

/// Round a f64 and clamp it to the i64 range, returning 0 for non-finite values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Apply a fractional percentage (`0.1` means ten percent) to a money amount, rounding.
#[must_use]
pub fn apply_fraction(amount: i64, fraction: f64) -> i64 {
    round_f64_to_i64(i64_to_f64(amount) * fraction)
}

/// Convert a board offset into a signed delta.
#[must_use]
pub fn usize_to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_round_to_nearest() {
        assert_eq!(apply_fraction(250, 0.1), 25);
        assert_eq!(apply_fraction(155, 0.5), 78);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
    }
}

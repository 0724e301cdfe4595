use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Game time in seconds. Countdowns and buff expiry are compared in this
/// unit, so elapsed-time arithmetic never drifts.
pub type Seconds = Fixed64;

/// Convert an f64 to Fixed64. Use only for initialization and data loading.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Whole seconds as [`Seconds`].
#[inline]
pub fn secs(v: u32) -> Seconds {
    Seconds::from_num(v)
}

/// `max(0, v)`.
#[inline]
pub fn clamp_non_negative(v: Fixed64) -> Fixed64 {
    if v < Fixed64::ZERO { Fixed64::ZERO } else { v }
}

/// Round a non-negative fixed-point value to the nearest integer (ties away
/// from zero). Negative inputs clamp to 0.
#[inline]
pub fn round_to_u64(v: Fixed64) -> u64 {
    let rounded: i64 = v.round().to_num();
    rounded.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_basic_arithmetic() {
        let a = f64_to_fixed64(1.5);
        let b = f64_to_fixed64(2.0);
        assert_eq!(fixed64_to_f64(a + b), 3.5);
    }

    #[test]
    fn quarter_second_ticks_sum_exactly() {
        let dt = f64_to_fixed64(0.25);
        let mut t = Seconds::ZERO;
        for _ in 0..12 {
            t += dt;
        }
        assert_eq!(t, secs(3));
    }

    #[test]
    fn clamp_non_negative_floors_at_zero() {
        assert_eq!(clamp_non_negative(f64_to_fixed64(-2.5)), Fixed64::ZERO);
        assert_eq!(clamp_non_negative(f64_to_fixed64(2.5)), f64_to_fixed64(2.5));
    }

    #[test]
    fn round_to_u64_ties_away_from_zero() {
        assert_eq!(round_to_u64(f64_to_fixed64(12.5)), 13);
        assert_eq!(round_to_u64(f64_to_fixed64(12.49)), 12);
        assert_eq!(round_to_u64(f64_to_fixed64(-3.0)), 0);
    }
}

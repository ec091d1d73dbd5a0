//! Width and range checks for unsigned arbitrary-precision values.

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Whether `value` can be bound to a parameter declared `width` bits wide,
/// i.e. `0 <= value < 2^width`.
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use ruleasm::width::fits;
///
/// assert!(fits(&BigUint::from(0xFFu32), 8));
/// assert!(!fits(&BigUint::from(0x100u32), 8));
/// assert!(fits(&BigUint::from(0u32), 0));
/// ```
#[inline]
#[must_use]
pub fn fits(value: &BigUint, width: u32) -> bool {
    value.bits() <= u64::from(width)
}

/// Number of bits needed to represent `value` (zero needs none).
#[inline]
#[must_use]
pub fn min_width(value: &BigUint) -> u64 {
    value.bits()
}

/// The low `width` bits of `value`, i.e. `value mod 2^width`.
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use ruleasm::width::low_bits;
///
/// assert_eq!(low_bits(&BigUint::from(0x215u32), 8), BigUint::from(0x15u32));
/// assert_eq!(low_bits(&BigUint::from(0x15u32), 24), BigUint::from(0x15u32));
/// ```
#[must_use]
pub fn low_bits(value: &BigUint, width: u32) -> BigUint {
    if fits(value, width) {
        return value.clone();
    }
    if width == 0 {
        return BigUint::zero();
    }
    let mask = (BigUint::one() << width) - 1u32;
    value & &mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u64) -> BigUint {
        BigUint::from(v)
    }

    #[test]
    fn fits_boundaries() {
        assert!(fits(&big(0), 1));
        assert!(fits(&big(1), 1));
        assert!(!fits(&big(2), 1));
        assert!(fits(&big(0xFFFF), 16));
        assert!(!fits(&big(0x1_0000), 16));
        assert!(fits(&big(0xFF_FFFF), 24));
        assert!(!fits(&big(0x100_0000), 24));
    }

    #[test]
    fn zero_width_admits_only_zero() {
        assert!(fits(&big(0), 0));
        assert!(!fits(&big(1), 0));
    }

    #[test]
    fn fits_beyond_machine_words() {
        let wide = BigUint::one() << 200u32;
        assert!(!fits(&wide, 200));
        assert!(fits(&wide, 201));
    }

    #[test]
    fn min_width_values() {
        assert_eq!(min_width(&big(0)), 0);
        assert_eq!(min_width(&big(1)), 1);
        assert_eq!(min_width(&big(0x215)), 10);
    }

    #[test]
    fn min_width_is_admission_boundary() {
        for v in [0u64, 1, 0x12, 0x215, 0xFF_FFFF, 0x100_0000] {
            let w = min_width(&big(v)) as u32;
            assert!(fits(&big(v), w));
            if w > 0 {
                assert!(!fits(&big(v), w - 1));
            }
        }
    }

    #[test]
    fn low_bits_truncates() {
        assert_eq!(low_bits(&big(0x215), 8), big(0x15));
        assert_eq!(low_bits(&big(0x215), 4), big(0x5));
        assert_eq!(low_bits(&big(0x215), 0), big(0));
        assert_eq!(low_bits(&big(0xABCD), 16), big(0xABCD));
    }
}

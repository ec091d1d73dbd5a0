//! Bit packing: a flat bit sequence becomes a byte buffer, most significant
//! bit first within each byte.

use alloc::vec;
use alloc::vec::Vec;

use crate::expand::BitSeq;

/// Policy for bit totals that are not a multiple of 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Padding {
    /// Fill the unused trailing (low-order) bits of the final byte with zeros.
    #[default]
    ZeroFill,
    /// Refuse unaligned totals with
    /// [`EncodeError::UnalignedOutput`](crate::error::EncodeError::UnalignedOutput).
    Reject,
}

/// Pack `bits` into bytes, MSB first.
///
/// Never fails: a trailing partial byte is zero-filled in its low bits.
///
/// # Examples
///
/// ```
/// use ruleasm::{pack, BitSeq};
///
/// let bits: BitSeq = [true, false, true, true].into_iter().collect();
/// assert_eq!(pack(&bits), vec![0b1011_0000]);
/// ```
#[must_use]
pub fn pack(bits: &BitSeq) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];
    for (i, bit) in bits.iter().enumerate() {
        if bit {
            out[i / 8] |= 0x80 >> (i % 8);
        }
    }
    out
}

/// Whether `bit_len` bits fill a whole number of bytes.
#[inline]
#[must_use]
pub fn is_byte_aligned(bit_len: u64) -> bool {
    bit_len % 8 == 0
}

/// Write `bits` into `buf` starting at bit offset `bit_offset`, growing the
/// buffer as needed. Bits already set in `buf` are preserved, so callers
/// append at increasing offsets.
pub fn pack_at(buf: &mut Vec<u8>, bit_offset: usize, bits: &BitSeq) {
    let end = bit_offset + bits.len();
    let needed = end.div_ceil(8);
    if buf.len() < needed {
        buf.resize(needed, 0);
    }
    for (i, bit) in bits.iter().enumerate() {
        let pos = bit_offset + i;
        let mask = 0x80 >> (pos % 8);
        if bit {
            buf[pos / 8] |= mask;
        } else {
            buf[pos / 8] &= !mask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;

    fn seq(value: u64, width: u32) -> BitSeq {
        let mut bits = BitSeq::new();
        bits.push_value(&BigUint::from(value), width);
        bits
    }

    #[test]
    fn empty_packs_to_nothing() {
        assert!(pack(&BitSeq::new()).is_empty());
    }

    #[test]
    fn msb_first_within_byte() {
        assert_eq!(pack(&seq(0x3315, 16)), vec![0x33, 0x15]);
        assert_eq!(pack(&seq(1, 8)), vec![0x01]);
    }

    #[test]
    fn partial_byte_is_zero_filled_in_low_bits() {
        assert_eq!(pack(&seq(0b101, 3)), vec![0b1010_0000]);
        assert_eq!(pack(&seq(0xABC, 12)), vec![0xAB, 0xC0]);
    }

    #[test]
    fn alignment_check() {
        assert!(is_byte_aligned(0));
        assert!(is_byte_aligned(16));
        assert!(!is_byte_aligned(12));
    }

    #[test]
    fn pack_at_appends_across_byte_boundaries() {
        let mut buf = Vec::new();
        pack_at(&mut buf, 0, &seq(0xA, 4));
        pack_at(&mut buf, 4, &seq(0xBC, 8));
        pack_at(&mut buf, 12, &seq(0xD, 4));
        assert_eq!(buf, vec![0xAB, 0xCD]);
    }

    #[test]
    fn pack_at_matches_pack_from_zero() {
        let bits = seq(0x1_2345, 20);
        let mut buf = Vec::new();
        pack_at(&mut buf, 0, &bits);
        assert_eq!(buf, pack(&bits));
    }
}

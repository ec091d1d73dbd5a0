//! Template expansion: a matched rule plus its arguments becomes a flat,
//! ordered bit sequence.

use alloc::vec::Vec;
use core::fmt;

use num_bigint::BigUint;

use crate::rule::{BitSegment, Rule};

/// An ordered sequence of bits, most significant first.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct BitSeq {
    bits: Vec<bool>,
}

impl BitSeq {
    /// Create an empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self { bits: Vec::new() }
    }

    /// Create an empty sequence with room for `bits` bits.
    #[must_use]
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bits: Vec::with_capacity(bits),
        }
    }

    /// Append one bit.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    /// Append the low `width` bits of `value`, most significant first.
    ///
    /// Bits above `value`'s magnitude are zeros, so a `width` wider than
    /// the value zero-extends it; a narrower one truncates it.
    pub fn push_value(&mut self, value: &BigUint, width: u32) {
        for bit in (0..u64::from(width)).rev() {
            self.bits.push(value.bit(bit));
        }
    }

    /// Append another sequence.
    pub fn append(&mut self, other: &BitSeq) {
        self.bits.extend_from_slice(&other.bits);
    }

    /// Number of bits.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the sequence is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// The bits as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    /// Iterate the bits in order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

impl From<Vec<bool>> for BitSeq {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

impl FromIterator<bool> for BitSeq {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}

/// Binary digits, e.g. `00110011`.
impl fmt::Display for BitSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Expand `rule`'s template with `args` bound to its parameters.
///
/// `args` must already be admitted by the rule (see
/// [`match_rule`](crate::matcher::match_rule)); emit widths are applied as
/// truncation or zero extension, never as a range check. A slice naming an
/// undeclared parameter, or an argument list shorter than the rule's
/// parameters, contributes zero bits of the slice's width; tables reject
/// such rules at construction.
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use ruleasm::{expand, Rule};
///
/// let rule = Rule::builder("ld").param("x", 24).constant(0x33u32, 8).slice("x", 8).build();
/// let bits = expand(&rule, &[BigUint::from(0x215u32)]);
/// assert_eq!(bits.to_string(), "0011001100010101");
/// ```
#[must_use]
pub fn expand(rule: &Rule, args: &[BigUint]) -> BitSeq {
    let zero = BigUint::default();
    let mut out = BitSeq::with_capacity(usize::try_from(rule.template_width()).unwrap_or(0));

    for segment in rule.template() {
        match segment {
            BitSegment::Constant { width, value } => out.push_value(value, *width),
            BitSegment::Slice { param, width } => {
                let value = rule
                    .param_index(param)
                    .and_then(|i| args.get(i))
                    .unwrap_or(&zero);
                out.push_value(value, *width);
            }
        }
    }

    out
}

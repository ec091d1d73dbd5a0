//! Public encoder API — one-shot encoding and the batch `Encoder` builder.
//!
//! This module ties together the matcher, the template expander and the
//! bit packer.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use num_bigint::BigUint;

use crate::error::EncodeError;
use crate::expand::expand;
use crate::matcher::{match_rule, RuleRef, TieBreak};
use crate::pack::{self, Padding};
use crate::table::{RuleSet, RuleTable};

/// Configurable resource limits for defense against pathological input.
///
/// All limits default to generous values.
///
/// # Examples
///
/// ```rust
/// use ruleasm::{Encoder, ResourceLimits};
///
/// let mut enc = Encoder::new();
/// enc.limits(ResourceLimits {
///     max_arguments: 8,
///     max_template_bits: 256,
///     max_invocations: 1_000,
///     max_output_bytes: 4096,
///     max_errors: 16,
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResourceLimits {
    /// Maximum number of arguments per invocation. Default: 64.
    pub max_arguments: usize,
    /// Maximum template width of a selected rule, in bits. Default: 65,536.
    pub max_template_bits: usize,
    /// Maximum number of invocations emitted into one `Encoder`.
    /// Default: 1,000,000.
    pub max_invocations: usize,
    /// Maximum total output size in bytes. Default: 16 MiB.
    pub max_output_bytes: usize,
    /// Maximum accumulated errors before bailing. Default: 64.
    pub max_errors: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_arguments: 64,
            max_template_bits: 65_536,
            max_invocations: 1_000_000,
            max_output_bytes: 16 * 1024 * 1024,
            max_errors: 64,
        }
    }
}

/// Encoding policy: tie-break direction, padding and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncoderConfig {
    /// How to choose among several qualifying rules.
    pub tie_break: TieBreak,
    /// What to do with bit totals that are not a multiple of 8.
    pub padding: Padding,
    /// Resource limits.
    pub limits: ResourceLimits,
}

/// One statement to encode: a mnemonic and its already-evaluated
/// arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Invocation {
    /// The mnemonic selecting a rule table.
    pub mnemonic: String,
    /// Argument values, in order.
    pub args: Vec<BigUint>,
}

impl Invocation {
    /// Create an invocation from anything convertible to `BigUint`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ruleasm::Invocation;
    ///
    /// let inv = Invocation::new("ld", [0x215u32]);
    /// assert_eq!(inv.args.len(), 1);
    /// ```
    #[must_use]
    pub fn new<I, V>(mnemonic: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<BigUint>,
    {
        Self {
            mnemonic: mnemonic.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for (i, arg) in self.args.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{:#x}", sep, arg)?;
        }
        Ok(())
    }
}

/// The encoding of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct EncodedOutput {
    bytes: Vec<u8>,
    bit_len: u64,
    rule: RuleRef,
}

impl EncodedOutput {
    /// The packed bytes (a partial final byte is zero-filled).
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of meaningful bits.
    #[must_use]
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// The rule that produced this output.
    #[must_use]
    pub fn rule(&self) -> &RuleRef {
        &self.rule
    }
}

/// Encode `args` against `table` with the default configuration.
///
/// # Errors
///
/// See [`encode_with`].
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use ruleasm::{encode_one, Rule, RuleTable};
///
/// let table = RuleTable::new("jr", vec![
///     Rule::builder("jr").param("off", 8).constant(0x18u32, 8).slice("off", 8).build(),
/// ])?;
/// let out = encode_one(&table, &[BigUint::from(0xFEu32)])?;
/// assert_eq!(out.bytes(), &[0x18, 0xFE]);
/// # Ok::<(), ruleasm::EncodeError>(())
/// ```
pub fn encode_one(table: &RuleTable, args: &[BigUint]) -> Result<EncodedOutput, EncodeError> {
    encode_with(table, args, &EncoderConfig::default())
}

/// Encode `args` against `table`: match, expand, pack.
///
/// # Errors
///
/// Returns [`EncodeError`] if no rule matches (arity or width), the
/// tie-break refuses to choose, the output is unaligned under
/// [`Padding::Reject`], or a resource limit is exceeded.
pub fn encode_with(
    table: &RuleTable,
    args: &[BigUint],
    config: &EncoderConfig,
) -> Result<EncodedOutput, EncodeError> {
    let limits = &config.limits;
    if args.len() > limits.max_arguments {
        return Err(EncodeError::ResourceLimitExceeded {
            resource: String::from("arguments"),
            limit: limits.max_arguments,
        });
    }

    let matched = match_rule(table, args, config.tie_break)?;

    let bit_len = matched.rule.template_width();
    if bit_len > limits.max_template_bits as u64 {
        return Err(EncodeError::ResourceLimitExceeded {
            resource: String::from("template bits"),
            limit: limits.max_template_bits,
        });
    }
    if config.padding == Padding::Reject && !pack::is_byte_aligned(bit_len) {
        return Err(EncodeError::UnalignedOutput {
            mnemonic: String::from(table.mnemonic()),
            bits: bit_len,
        });
    }

    let bits = expand(matched.rule, args);
    Ok(EncodedOutput {
        bytes: pack::pack(&bits),
        bit_len,
        rule: matched.rule_ref(),
    })
}

/// Where one emitted invocation landed in the batch output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InvocationRecord {
    /// Bit offset of the first encoded bit.
    pub bit_offset: u64,
    /// Number of encoded bits.
    pub bit_len: u64,
    /// The rule that produced them.
    pub rule: RuleRef,
    /// The invocation as written, for listings.
    pub source: String,
}

/// The result of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct EncodingResult {
    bytes: Vec<u8>,
    bit_len: u64,
    records: Vec<InvocationRecord>,
}

impl EncodingResult {
    /// The packed output.
    ///
    /// # Examples
    ///
    /// ```
    /// use ruleasm::{Encoder, Invocation, Rule, RuleSet, RuleTable};
    ///
    /// let set = RuleSet::new("demo").with(RuleTable::new("nop", vec![
    ///     Rule::builder("nop").constant(0x00u32, 8).build(),
    /// ])?)?;
    /// let mut enc = Encoder::new();
    /// enc.add_ruleset(set);
    /// enc.emit(&Invocation::new("nop", Vec::<u32>::new()))?;
    /// assert_eq!(enc.finish()?.bytes(), &[0x00]);
    /// # Ok::<(), ruleasm::EncodeError>(())
    /// ```
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume and return the bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Total number of meaningful bits.
    #[must_use]
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Byte count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was encoded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// One record per emitted invocation, in emission order.
    #[must_use]
    pub fn records(&self) -> &[InvocationRecord] {
        &self.records
    }

    /// Human-readable listing: offset, hex bytes, rule and source.
    ///
    /// Offsets are in bytes; an invocation starting mid-byte shows the bit
    /// within the byte after a dot.
    ///
    /// # Example output
    ///
    /// ```text
    /// 00000000  3315              ld#2  ld 0x215
    /// 00000002  2200FF            ld#1  ld 0xff
    /// ```
    #[must_use]
    pub fn listing(&self) -> String {
        use core::fmt::Write;

        let mut out = String::new();
        for record in &self.records {
            let start = record.bit_offset;
            let end = start + record.bit_len;
            let first = (start / 8) as usize;
            let last = end.div_ceil(8) as usize;
            let hex: String = self.bytes[first..last.min(self.bytes.len())]
                .iter()
                .fold(String::new(), |mut acc, b| {
                    let _ = write!(acc, "{:02X}", b);
                    acc
                });

            let offset = if start % 8 == 0 {
                format!("{:08X}", start / 8)
            } else {
                format!("{:08X}.{}", start / 8, start % 8)
            };
            let rule = format!("{}", record.rule);
            let _ = writeln!(
                out,
                "{:<10}  {:<16}  {:<6}  {}",
                offset, hex, rule, record.source
            );
        }
        out
    }
}

impl fmt::LowerHex for EncodingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::UpperHex for EncodingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bytes {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}

/// Builder-pattern batch encoder.
///
/// Holds rule sets, encodes invocations one after another into a single
/// bit stream, and collects errors until [`finish`](Encoder::finish).
///
/// # Examples
///
/// ```rust
/// use ruleasm::{Encoder, Invocation, Rule, RuleSet, RuleTable};
///
/// let set = RuleSet::new("demo").with(RuleTable::new("ld", vec![
///     Rule::builder("ld").param("x", 8).constant(0x3Eu32, 8).slice("x", 8).build(),
/// ])?)?;
///
/// let mut enc = Encoder::new();
/// enc.add_ruleset(set);
/// enc.emit(&Invocation::new("ld", [0x42u32]))?;
/// enc.emit(&Invocation::new("ld", [0x43u32]))?;
/// let result = enc.finish()?;
/// assert_eq!(result.bytes(), &[0x3E, 0x42, 0x3E, 0x43]);
/// # Ok::<(), ruleasm::EncodeError>(())
/// ```
#[derive(Debug, Default)]
pub struct Encoder {
    config: EncoderConfig,
    rulesets: Vec<RuleSet>,
    /// Indices into `rulesets`, in activation order.
    active: Vec<usize>,
    output: Vec<u8>,
    bit_offset: u64,
    records: Vec<InvocationRecord>,
    /// Accumulated errors for multi-error mode.
    errors: Vec<EncodeError>,
}

impl Encoder {
    /// Create an encoder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with an explicit configuration.
    #[must_use]
    pub fn with_config(config: EncoderConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Set the tie-break policy.
    pub fn tie_break(&mut self, tie_break: TieBreak) -> &mut Self {
        self.config.tie_break = tie_break;
        self
    }

    /// Set the padding policy.
    pub fn padding(&mut self, padding: Padding) -> &mut Self {
        self.config.padding = padding;
        self
    }

    /// Set resource limits.
    pub fn limits(&mut self, limits: ResourceLimits) -> &mut Self {
        self.config.limits = limits;
        self
    }

    /// Add a rule set. Until [`activate`](Self::activate) is called, every
    /// added set is searched, later sets first.
    pub fn add_ruleset(&mut self, set: RuleSet) -> &mut Self {
        self.rulesets.push(set);
        self
    }

    /// Activate a rule set by name. Only active sets are searched once any
    /// set has been activated; the most recently activated set wins when
    /// several define the same mnemonic.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownRuleSet`] if no set has that name.
    pub fn activate(&mut self, name: &str) -> Result<&mut Self, EncodeError> {
        let index = self
            .rulesets
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| EncodeError::UnknownRuleSet {
                name: String::from(name),
            })?;
        self.active.retain(|&i| i != index);
        self.active.push(index);
        tracing::debug!(ruleset = name, "rule set activated");
        Ok(self)
    }

    /// Find the table for `mnemonic` among the searchable rule sets.
    #[must_use]
    pub fn lookup(&self, mnemonic: &str) -> Option<&RuleTable> {
        if self.active.is_empty() {
            self.rulesets.iter().rev().find_map(|s| s.get(mnemonic))
        } else {
            self.active
                .iter()
                .rev()
                .filter_map(|&i| self.rulesets.get(i))
                .find_map(|s| s.get(mnemonic))
        }
    }

    /// Encode a single invocation without touching the batch output.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::UnknownMnemonic`] if no searchable rule set
    /// defines the mnemonic, or any error of [`encode_with`].
    pub fn encode(&self, invocation: &Invocation) -> Result<EncodedOutput, EncodeError> {
        let table = self
            .lookup(&invocation.mnemonic)
            .ok_or_else(|| EncodeError::UnknownMnemonic {
                mnemonic: invocation.mnemonic.clone(),
            })?;
        encode_with(table, &invocation.args, &self.config)
    }

    /// Encode an invocation and append it to the batch output.
    ///
    /// Encoding failures are collected and reported by
    /// [`finish`](Self::finish); this only fails early when a resource
    /// limit is hit.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::ResourceLimitExceeded`] when the invocation,
    /// output or error limits are exceeded.
    pub fn emit(&mut self, invocation: &Invocation) -> Result<&mut Self, EncodeError> {
        let limits = self.config.limits;
        if self.records.len() + self.errors.len() >= limits.max_invocations {
            return Err(EncodeError::ResourceLimitExceeded {
                resource: String::from("invocations"),
                limit: limits.max_invocations,
            });
        }

        match self.encode(invocation) {
            Ok(encoded) => {
                let end = self.bit_offset + encoded.bit_len;
                if end.div_ceil(8) > limits.max_output_bytes as u64 {
                    return Err(EncodeError::ResourceLimitExceeded {
                        resource: String::from("output bytes"),
                        limit: limits.max_output_bytes,
                    });
                }
                self.append(invocation, encoded);
            }
            Err(e) => {
                tracing::debug!(error = %e, "invocation failed");
                self.errors.push(e);
                if self.errors.len() >= limits.max_errors {
                    return Err(EncodeError::ResourceLimitExceeded {
                        resource: String::from("errors"),
                        limit: limits.max_errors,
                    });
                }
            }
        }
        Ok(self)
    }

    fn append(&mut self, invocation: &Invocation, encoded: EncodedOutput) {
        let bit_offset = self.bit_offset;
        if bit_offset % 8 == 0 {
            self.output.truncate((bit_offset / 8) as usize);
            self.output.extend_from_slice(&encoded.bytes);
        } else {
            let mut bits = crate::expand::BitSeq::with_capacity(encoded.bit_len as usize);
            for i in 0..encoded.bit_len {
                let byte = encoded.bytes[(i / 8) as usize];
                bits.push(byte & (0x80 >> (i % 8)) != 0);
            }
            pack::pack_at(&mut self.output, bit_offset as usize, &bits);
        }
        self.bit_offset += encoded.bit_len;
        self.records.push(InvocationRecord {
            bit_offset,
            bit_len: encoded.bit_len,
            rule: encoded.rule,
            source: format!("{}", invocation),
        });
    }

    /// Errors collected so far.
    #[must_use]
    pub fn errors(&self) -> &[EncodeError] {
        &self.errors
    }

    /// Current bit offset of the batch output.
    #[must_use]
    pub fn bit_offset(&self) -> u64 {
        self.bit_offset
    }

    /// Finish the batch.
    ///
    /// # Errors
    ///
    /// Returns the single collected error, or [`EncodeError::Multiple`] if
    /// there were several.
    pub fn finish(mut self) -> Result<EncodingResult, EncodeError> {
        if !self.errors.is_empty() {
            if self.errors.len() == 1 {
                return Err(self.errors.remove(0));
            }
            return Err(EncodeError::Multiple {
                errors: self.errors,
            });
        }

        self.output.truncate(self.bit_offset.div_ceil(8) as usize);

        tracing::debug!(
            invocations = self.records.len(),
            bits = self.bit_offset,
            "encoding finished"
        );

        Ok(EncodingResult {
            bytes: self.output,
            bit_len: self.bit_offset,
            records: self.records,
        })
    }
}

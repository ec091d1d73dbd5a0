//! # ruleasm — Rule-Based Instruction Encoder
//!
//! `ruleasm` turns a mnemonic invocation with already-evaluated integer
//! arguments into bit-exact machine code, driven by tables of rule
//! alternatives instead of hand-written per-instruction encoders.
//!
//! ## Quick Start
//!
//! ```rust
//! use num_bigint::BigUint;
//! use ruleasm::{encode_one, Rule, RuleTable, TableOptions};
//!
//! // Three alternatives for `ld`, accepting 8/16/24-bit values and
//! // emitting 24/16/8-bit fields.
//! let table = RuleTable::with_options(
//!     "ld",
//!     vec![
//!         Rule::builder("ld").param("x", 8).constant(0x11u32, 8).slice("x", 24).build(),
//!         Rule::builder("ld").param("x", 16).constant(0x22u32, 8).slice("x", 16).build(),
//!         Rule::builder("ld").param("x", 24).constant(0x33u32, 8).slice("x", 8).build(),
//!     ],
//!     TableOptions::mixed_widths(),
//! )?;
//!
//! let out = encode_one(&table, &[BigUint::from(0x215u32)])?;
//! assert_eq!(out.bytes(), &[0x33, 0x15]);
//! # Ok::<(), ruleasm::EncodeError>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Matcher** — filters a [`RuleTable`] by arity, admits arguments by
//!   declared width, and applies a [`TieBreak`] (last-declared by default).
//! - **Expander** — walks the winning rule's template into a [`BitSeq`];
//!   parameter slices are truncated or zero-extended to their emit width.
//! - **Packer** — packs bits MSB-first into bytes; a partial final byte is
//!   zero-filled unless [`Padding::Reject`] is selected.
//!
//! ## Features
//!
//! - **`no_std` + `alloc`** — disable the default `std` feature.
//! - **`serde`** — serialization for rules, tables, errors and results.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// Encoders routinely narrow between integer widths and spell bit patterns
// as dense hex literals.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::unreadable_literal,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::uninlined_format_args,
    clippy::doc_markdown,
    clippy::missing_errors_doc,
    clippy::return_self_not_must_use
)]

extern crate alloc;

/// Public encoder API — one-shot encoding, batch `Encoder`, configuration.
pub mod encoder;
/// Error types for validation, matching and encoding.
pub mod error;
/// Template expansion into flat bit sequences.
pub mod expand;
/// Rule matching and tie-break policies.
pub mod matcher;
/// MSB-first bit packing.
pub mod pack;
/// Rules, parameters and bit segments.
pub mod rule;
/// Rule tables and named rule sets.
pub mod table;
/// Width and range checks.
pub mod width;

// Re-exports
pub use encoder::{
    encode_one, encode_with, EncodedOutput, Encoder, EncoderConfig, EncodingResult, Invocation,
    InvocationRecord, ResourceLimits,
};
pub use error::{EncodeError, RuleDefect};
pub use expand::{expand, BitSeq};
pub use matcher::{match_rule, Match, RuleRef, TieBreak};
pub use pack::{pack, Padding};
pub use rule::{BitSegment, Parameter, Rule, RuleBuilder};
pub use table::{RuleSet, RuleTable, TableOptions};
pub use width::fits;

/// Encode one invocation against a rule set with the default configuration.
///
/// # Errors
///
/// Returns [`EncodeError::UnknownMnemonic`] if `set` has no table for the
/// mnemonic, or any error of [`encode_with`].
///
/// # Examples
///
/// ```rust
/// use ruleasm::{encode, Invocation, Rule, RuleSet, RuleTable};
///
/// let set = RuleSet::new("demo").with(RuleTable::new("halt", vec![
///     Rule::builder("halt").constant(0x76u32, 8).build(),
/// ])?)?;
/// let out = encode(&set, &Invocation::new("halt", Vec::<u32>::new()))?;
/// assert_eq!(out.bytes(), &[0x76]);
/// # Ok::<(), ruleasm::EncodeError>(())
/// ```
pub fn encode(set: &RuleSet, invocation: &Invocation) -> Result<EncodedOutput, EncodeError> {
    let table = set
        .get(&invocation.mnemonic)
        .ok_or_else(|| EncodeError::UnknownMnemonic {
            mnemonic: invocation.mnemonic.clone(),
        })?;
    encode_one(table, &invocation.args)
}

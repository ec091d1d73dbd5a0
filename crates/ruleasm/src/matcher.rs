//! Rule matching: arity filter, width admission and tie-break.
//!
//! Matching is a pure function of the table, the arguments and the
//! tie-break policy. The same inputs always select the same rule.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use num_bigint::BigUint;

use crate::error::EncodeError;
use crate::rule::Rule;
use crate::table::RuleTable;
use crate::width;

/// How to choose among several rules that all admit the arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    /// The last-declared qualifying rule wins.
    #[default]
    LastDeclared,
    /// The first-declared qualifying rule wins.
    FirstDeclared,
    /// The rule with the smallest total declared parameter width wins;
    /// equally narrow rules fall back to last-declared.
    Narrowest,
    /// Refuse to choose: fail with [`EncodeError::AmbiguousMatch`].
    Reject,
}

impl TieBreak {
    /// Pick one declaration index out of `qualified` (ascending, non-empty).
    fn pick(self, table: &RuleTable, qualified: &[usize]) -> Option<usize> {
        match self {
            TieBreak::LastDeclared => qualified.last().copied(),
            TieBreak::FirstDeclared => qualified.first().copied(),
            TieBreak::Narrowest => {
                let mut best: Option<(usize, u64)> = None;
                for &index in qualified {
                    let declared = table.get(index)?.declared_width();
                    match best {
                        Some((_, w)) if declared > w => {}
                        _ => best = Some((index, declared)),
                    }
                }
                best.map(|(index, _)| index)
            }
            TieBreak::Reject => None,
        }
    }
}

/// Identifies a rule by mnemonic and declaration index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleRef {
    /// Mnemonic of the table the rule belongs to.
    pub mnemonic: String,
    /// Declaration index within the table.
    pub index: usize,
}

impl fmt::Display for RuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.mnemonic, self.index)
    }
}

/// The outcome of a successful match.
#[derive(Debug, Clone, Copy)]
pub struct Match<'t> {
    /// Declaration index of the selected rule.
    pub index: usize,
    /// The selected rule.
    pub rule: &'t Rule,
    /// How many rules qualified before the tie-break.
    pub qualified: usize,
}

impl Match<'_> {
    /// An owned reference to the selected rule.
    #[must_use]
    pub fn rule_ref(&self) -> RuleRef {
        RuleRef {
            mnemonic: String::from(self.rule.mnemonic()),
            index: self.index,
        }
    }
}

/// First argument that does not fit its parameter, as
/// `(arg_index, declared_width)`.
fn first_misfit(rule: &Rule, args: &[BigUint]) -> Option<(usize, u32)> {
    rule.parameters()
        .iter()
        .zip(args)
        .enumerate()
        .find(|(_, (param, value))| !width::fits(value, param.width))
        .map(|(i, (param, _))| (i, param.width))
}

/// Select the rule of `table` that encodes `args`.
///
/// # Errors
///
/// - [`EncodeError::ArityMismatch`] if no rule takes `args.len()` parameters.
/// - [`EncodeError::NoMatchingRule`] if no arity-matching rule admits every
///   argument; the failure is reported against the last-declared candidate.
/// - [`EncodeError::AmbiguousMatch`] if several rules qualify and
///   `tie_break` is [`TieBreak::Reject`].
///
/// # Examples
///
/// ```
/// use num_bigint::BigUint;
/// use ruleasm::{match_rule, Rule, RuleTable, TieBreak};
///
/// let table = RuleTable::new("ld", vec![
///     Rule::builder("ld").param("x", 8).constant(0x11u32, 8).slice("x", 8).build(),
///     Rule::builder("ld").param("x", 16).constant(0x22u32, 8).slice("x", 8).build(),
/// ])?;
/// let m = match_rule(&table, &[BigUint::from(5u32)], TieBreak::LastDeclared)?;
/// assert_eq!(m.index, 1);
/// let m = match_rule(&table, &[BigUint::from(5u32)], TieBreak::FirstDeclared)?;
/// assert_eq!(m.index, 0);
/// # Ok::<(), ruleasm::EncodeError>(())
/// ```
pub fn match_rule<'t>(
    table: &'t RuleTable,
    args: &[BigUint],
    tie_break: TieBreak,
) -> Result<Match<'t>, EncodeError> {
    let mut any_arity = false;
    let mut qualified: Vec<usize> = Vec::new();
    let mut misfit: Option<(usize, usize, u32)> = None;

    for (index, rule) in table.rules().iter().enumerate() {
        if rule.arity() != args.len() {
            continue;
        }
        any_arity = true;
        match first_misfit(rule, args) {
            None => qualified.push(index),
            Some((arg_index, width)) => {
                tracing::trace!(
                    mnemonic = table.mnemonic(),
                    rule = index,
                    arg_index,
                    width,
                    needed = args.get(arg_index).map_or(0, crate::width::min_width),
                    "candidate rejected"
                );
                misfit = Some((index, arg_index, width));
            }
        }
    }

    if !any_arity {
        return Err(EncodeError::ArityMismatch {
            mnemonic: String::from(table.mnemonic()),
            got: args.len(),
            expected: table.arities(),
        });
    }

    let index = match qualified.as_slice() {
        [] => {
            let (rule, arg_index, width) = misfit.unwrap_or_default();
            return Err(EncodeError::NoMatchingRule {
                mnemonic: String::from(table.mnemonic()),
                rule,
                arg_index,
                value: args.get(arg_index).cloned().unwrap_or_default(),
                width,
            });
        }
        [only] => *only,
        many => tie_break
            .pick(table, many)
            .ok_or_else(|| EncodeError::AmbiguousMatch {
                mnemonic: String::from(table.mnemonic()),
                candidates: many.to_vec(),
            })?,
    };

    let rule = &table.rules()[index];

    tracing::debug!(
        mnemonic = table.mnemonic(),
        rule = index,
        qualified = qualified.len(),
        "rule selected"
    );

    Ok(Match {
        index,
        rule,
        qualified: qualified.len(),
    })
}

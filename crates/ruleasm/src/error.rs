//! Error types for rule validation, matching and encoding.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use num_bigint::BigUint;

/// What is wrong with a rule that was rejected while building a table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RuleDefect {
    /// A constant segment's value does not fit its declared width.
    ConstantOverflow {
        /// Index of the segment within the template.
        segment: usize,
        /// The constant value.
        value: BigUint,
        /// The declared segment width in bits.
        width: u32,
    },

    /// A slice segment names a parameter the rule does not declare.
    UnknownParameter {
        /// Index of the segment within the template.
        segment: usize,
        /// The parameter name that could not be resolved.
        name: String,
    },

    /// Two parameters of the same rule share a name.
    DuplicateParameter {
        /// The repeated parameter name.
        name: String,
    },

    /// The rule's total template width differs from the rest of its table.
    WidthMismatch {
        /// Width of the first rule in the table.
        expected: u64,
        /// Width of this rule.
        found: u64,
    },

    /// The rule was declared for a different mnemonic than its table.
    MnemonicMismatch {
        /// The mnemonic the rule was declared with.
        found: String,
    },

    /// The table contains no rules at all.
    NoRules,
}

impl fmt::Display for RuleDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDefect::ConstantOverflow {
                segment,
                value,
                width,
            } => write!(
                f,
                "constant {:#x} in segment {} does not fit in {} bits",
                value, segment, width
            ),
            RuleDefect::UnknownParameter { segment, name } => {
                write!(f, "segment {} refers to unknown parameter '{}'", segment, name)
            }
            RuleDefect::DuplicateParameter { name } => {
                write!(f, "parameter '{}' declared more than once", name)
            }
            RuleDefect::WidthMismatch { expected, found } => write!(
                f,
                "template is {} bits wide but sibling rules are {} bits",
                found, expected
            ),
            RuleDefect::MnemonicMismatch { found } => {
                write!(f, "rule declared for mnemonic '{}'", found)
            }
            RuleDefect::NoRules => write!(f, "table declares no rules"),
        }
    }
}

/// Encoding error with enough structure for a caller to produce a
/// precise diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EncodeError {
    /// No rule table is registered for the mnemonic.
    UnknownMnemonic {
        /// The mnemonic that was not recognized.
        mnemonic: String,
    },

    /// No rule set with the given name has been added.
    UnknownRuleSet {
        /// The requested rule set name.
        name: String,
    },

    /// The argument count matches no rule of the mnemonic.
    ArityMismatch {
        /// The invoked mnemonic.
        mnemonic: String,
        /// Number of arguments supplied.
        got: usize,
        /// Distinct parameter counts the table declares, ascending.
        expected: Vec<usize>,
    },

    /// Arity matched, but no rule's declared widths admit the arguments.
    NoMatchingRule {
        /// The invoked mnemonic.
        mnemonic: String,
        /// Declaration index of the rule the failure is reported against.
        rule: usize,
        /// Index of the first argument that did not fit.
        arg_index: usize,
        /// The offending argument value.
        value: BigUint,
        /// Declared width of the parameter it was bound to.
        width: u32,
    },

    /// Several rules qualify and the tie-break policy refuses to choose.
    AmbiguousMatch {
        /// The invoked mnemonic.
        mnemonic: String,
        /// Declaration indices of all qualifying rules.
        candidates: Vec<usize>,
    },

    /// A rule failed validation while its table was being built.
    MalformedRule {
        /// Mnemonic of the table being built.
        mnemonic: String,
        /// Declaration index of the offending rule.
        rule: usize,
        /// What is wrong with it.
        defect: RuleDefect,
    },

    /// The encoded bit count is not a multiple of 8 and padding is refused.
    UnalignedOutput {
        /// The invoked mnemonic.
        mnemonic: String,
        /// Total number of encoded bits.
        bits: u64,
    },

    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Human-readable name of the resource (e.g. "arguments").
        resource: String,
        /// The configured limit that was exceeded.
        limit: usize,
    },

    /// Multiple errors collected while encoding a batch.
    Multiple {
        /// The collected errors, in emission order.
        errors: Vec<EncodeError>,
    },
}

impl EncodeError {
    /// Whether this error means "no rule accepts the invocation".
    ///
    /// Arity mismatches are a sub-kind of this failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use ruleasm::EncodeError;
    ///
    /// let err = EncodeError::ArityMismatch {
    ///     mnemonic: "ld".into(),
    ///     got: 2,
    ///     expected: vec![1],
    /// };
    /// assert!(err.is_no_match());
    /// ```
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            EncodeError::ArityMismatch { .. } | EncodeError::NoMatchingRule { .. }
        )
    }

    /// The mnemonic the error refers to, if any.
    #[must_use]
    pub fn mnemonic(&self) -> Option<&str> {
        match self {
            EncodeError::UnknownMnemonic { mnemonic }
            | EncodeError::ArityMismatch { mnemonic, .. }
            | EncodeError::NoMatchingRule { mnemonic, .. }
            | EncodeError::AmbiguousMatch { mnemonic, .. }
            | EncodeError::MalformedRule { mnemonic, .. }
            | EncodeError::UnalignedOutput { mnemonic, .. } => Some(mnemonic),
            EncodeError::UnknownRuleSet { .. }
            | EncodeError::ResourceLimitExceeded { .. }
            | EncodeError::Multiple { .. } => None,
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[usize]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::UnknownMnemonic { mnemonic } => {
                write!(f, "unknown mnemonic '{}'", mnemonic)
            }
            EncodeError::UnknownRuleSet { name } => write!(f, "unknown rule set '{}'", name),
            EncodeError::ArityMismatch {
                mnemonic,
                got,
                expected,
            } => {
                write!(
                    f,
                    "'{}' takes no form with {} argument(s) (expected ",
                    mnemonic, got
                )?;
                write_list(f, expected)?;
                write!(f, ")")
            }
            EncodeError::NoMatchingRule {
                mnemonic,
                rule,
                arg_index,
                value,
                width,
            } => write!(
                f,
                "no rule of '{}' accepts the arguments: argument {} ({:#x}) does not fit in {} bits (rule {})",
                mnemonic, arg_index, value, width, rule
            ),
            EncodeError::AmbiguousMatch {
                mnemonic,
                candidates,
            } => {
                write!(f, "ambiguous match for '{}': rules ", mnemonic)?;
                write_list(f, candidates)?;
                write!(f, " all qualify")
            }
            EncodeError::MalformedRule {
                mnemonic,
                rule,
                defect,
            } => write!(f, "malformed rule {} of '{}': {}", rule, mnemonic, defect),
            EncodeError::UnalignedOutput { mnemonic, bits } => write!(
                f,
                "encoding of '{}' is {} bits, not a whole number of bytes",
                mnemonic, bits
            ),
            EncodeError::ResourceLimitExceeded { resource, limit } => {
                write!(
                    f,
                    "resource limit exceeded: {} (limit: {})",
                    resource, limit
                )
            }
            EncodeError::Multiple { errors } => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

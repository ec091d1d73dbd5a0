//! Rule alternatives: parameters, bit segments and templates.
//!
//! A [`Rule`] is one candidate encoding of a mnemonic. Its parameters carry
//! a *declared* width (what values the rule accepts), while its template
//! slices carry an independent *emit* width (how many low-order bits end up
//! in the output). The two are never conflated: a rule may accept 24-bit
//! values and still emit only an 8-bit field.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use num_bigint::BigUint;

use crate::error::RuleDefect;
use crate::width;

/// A named rule parameter with its declared (acceptance) width.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameter {
    /// Parameter name, referenced by [`BitSegment::Slice`].
    pub name: String,
    /// Declared width in bits: arguments must satisfy `value < 2^width`.
    pub width: u32,
}

impl Parameter {
    /// Create a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

/// One piece of a rule's output template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitSegment {
    /// A fixed bit pattern, `width` bits wide.
    Constant {
        /// Number of bits emitted.
        width: u32,
        /// The value; must fit in `width` bits.
        value: BigUint,
    },
    /// The low `width` bits of a bound parameter.
    ///
    /// Wider than the parameter's declared width means zero extension.
    Slice {
        /// Name of the parameter to read.
        param: String,
        /// Number of bits emitted (emit width).
        width: u32,
    },
}

impl BitSegment {
    /// A constant segment.
    #[must_use]
    pub fn constant(value: impl Into<BigUint>, width: u32) -> Self {
        BitSegment::Constant {
            width,
            value: value.into(),
        }
    }

    /// A parameter slice segment.
    #[must_use]
    pub fn slice(param: impl Into<String>, width: u32) -> Self {
        BitSegment::Slice {
            param: param.into(),
            width,
        }
    }

    /// Number of bits this segment contributes.
    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            BitSegment::Constant { width, .. } | BitSegment::Slice { width, .. } => *width,
        }
    }
}

impl fmt::Display for BitSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitSegment::Constant { width, value } => write!(f, "{:#x}`{}", value, width),
            BitSegment::Slice { param, width } => write!(f, "{}`{}", param, width),
        }
    }
}

/// One alternative encoding for a mnemonic.
///
/// Immutable once built; validation against its siblings happens when it
/// is placed in a [`RuleTable`](crate::table::RuleTable).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    mnemonic: String,
    parameters: Vec<Parameter>,
    template: Vec<BitSegment>,
}

impl Rule {
    /// Create a rule from its parts.
    #[must_use]
    pub fn new(
        mnemonic: impl Into<String>,
        parameters: Vec<Parameter>,
        template: Vec<BitSegment>,
    ) -> Self {
        Self {
            mnemonic: mnemonic.into(),
            parameters,
            template,
        }
    }

    /// Start a fluent [`RuleBuilder`].
    ///
    /// # Examples
    ///
    /// ```
    /// use ruleasm::Rule;
    ///
    /// let rule = Rule::builder("ld")
    ///     .param("x", 16)
    ///     .constant(0x22u32, 8)
    ///     .slice("x", 16)
    ///     .build();
    /// assert_eq!(rule.arity(), 1);
    /// assert_eq!(rule.template_width(), 24);
    /// ```
    #[must_use]
    pub fn builder(mnemonic: impl Into<String>) -> RuleBuilder {
        RuleBuilder {
            rule: Rule::new(mnemonic, Vec::new(), Vec::new()),
        }
    }

    /// The mnemonic this rule encodes.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Template segments in emission order.
    #[must_use]
    pub fn template(&self) -> &[BitSegment] {
        &self.template
    }

    /// Number of parameters.
    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Total number of bits the template emits.
    #[must_use]
    pub fn template_width(&self) -> u64 {
        self.template.iter().map(|s| u64::from(s.width())).sum()
    }

    /// Sum of the parameters' declared widths.
    #[must_use]
    pub fn declared_width(&self) -> u64 {
        self.parameters.iter().map(|p| u64::from(p.width)).sum()
    }

    /// Position of the parameter called `name`.
    #[inline]
    #[must_use]
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    /// Check the rule on its own: parameter names are unique, every slice
    /// names a declared parameter, and every constant fits its width.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleDefect`] found, in declaration order.
    pub fn validate(&self) -> Result<(), RuleDefect> {
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(RuleDefect::DuplicateParameter {
                    name: param.name.clone(),
                });
            }
        }

        for (segment, seg) in self.template.iter().enumerate() {
            match seg {
                BitSegment::Constant { width, value } => {
                    if !width::fits(value, *width) {
                        return Err(RuleDefect::ConstantOverflow {
                            segment,
                            value: value.clone(),
                            width: *width,
                        });
                    }
                }
                BitSegment::Slice { param, .. } => {
                    if self.param_index(param).is_none() {
                        return Err(RuleDefect::UnknownParameter {
                            segment,
                            name: param.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic)?;
        for (i, p) in self.parameters.iter().enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            write!(f, "{}{{{}: u{}}}", sep, p.name, p.width)?;
        }
        write!(f, " =>")?;
        for (i, seg) in self.template.iter().enumerate() {
            let sep = if i == 0 { " " } else { " @ " };
            write!(f, "{}{}", sep, seg)?;
        }
        Ok(())
    }
}

/// Fluent builder for [`Rule`].
#[derive(Debug, Clone)]
#[must_use]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Declare the next parameter.
    pub fn param(mut self, name: impl Into<String>, width: u32) -> Self {
        self.rule.parameters.push(Parameter::new(name, width));
        self
    }

    /// Append a constant segment.
    pub fn constant(mut self, value: impl Into<BigUint>, width: u32) -> Self {
        self.rule.template.push(BitSegment::constant(value, width));
        self
    }

    /// Append a parameter slice segment.
    pub fn slice(mut self, param: impl Into<String>, width: u32) -> Self {
        self.rule.template.push(BitSegment::slice(param, width));
        self
    }

    /// Finish the rule.
    pub fn build(self) -> Rule {
        self.rule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn ld_u24() -> Rule {
        Rule::builder("ld")
            .param("x", 24)
            .constant(0x33u32, 8)
            .slice("x", 8)
            .build()
    }

    #[test]
    fn declared_and_emit_widths_stay_distinct() {
        let rule = ld_u24();
        assert_eq!(rule.parameters()[0].width, 24);
        assert_eq!(rule.template()[1].width(), 8);
        assert_eq!(rule.declared_width(), 24);
        assert_eq!(rule.template_width(), 16);
    }

    #[test]
    fn validate_accepts_well_formed_rule() {
        assert_eq!(ld_u24().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_constant_overflow() {
        let rule = Rule::builder("x").constant(0x100u32, 8).build();
        assert_eq!(
            rule.validate(),
            Err(RuleDefect::ConstantOverflow {
                segment: 0,
                value: BigUint::from(0x100u32),
                width: 8,
            })
        );
    }

    #[test]
    fn validate_rejects_unknown_parameter() {
        let rule = Rule::builder("x")
            .param("a", 8)
            .constant(1u32, 8)
            .slice("b", 8)
            .build();
        assert_eq!(
            rule.validate(),
            Err(RuleDefect::UnknownParameter {
                segment: 1,
                name: "b".to_string(),
            })
        );
    }

    #[test]
    fn validate_rejects_duplicate_parameter() {
        let rule = Rule::builder("x")
            .param("a", 8)
            .param("a", 16)
            .slice("a", 8)
            .build();
        assert_eq!(
            rule.validate(),
            Err(RuleDefect::DuplicateParameter {
                name: "a".to_string(),
            })
        );
    }

    #[test]
    fn display_reads_like_a_rule_definition() {
        assert_eq!(ld_u24().to_string(), "ld {x: u24} => 0x33`8 @ x`8");
        let two = Rule::builder("mv")
            .param("a", 4)
            .param("b", 4)
            .slice("a", 4)
            .slice("b", 4)
            .build();
        assert_eq!(two.to_string(), "mv {a: u4}, {b: u4} => a`4 @ b`4");
    }
}

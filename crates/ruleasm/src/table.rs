//! Rule tables (all alternatives of one mnemonic) and named rule sets.

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{EncodeError, RuleDefect};
use crate::rule::Rule;

/// Construction-time validation options for a [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableOptions {
    /// Accept alternatives whose templates differ in total width.
    ///
    /// The conflict is still logged and reported by
    /// [`RuleTable::width_conflicts`].
    pub allow_mixed_widths: bool,
}

impl TableOptions {
    /// Options that accept templates of differing total width.
    #[must_use]
    pub fn mixed_widths() -> Self {
        Self {
            allow_mixed_widths: true,
        }
    }
}

/// All rule alternatives for one mnemonic, in declaration order.
///
/// Declaration order is significant: it drives the default tie-break.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedTable"))]
pub struct RuleTable {
    mnemonic: String,
    rules: Vec<Rule>,
    options: TableOptions,
}

impl RuleTable {
    /// Build and validate a table with default options.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedRule`] for the first invalid rule.
    ///
    /// # Examples
    ///
    /// ```
    /// use ruleasm::{Rule, RuleTable};
    ///
    /// let table = RuleTable::new("nop", vec![Rule::builder("nop").constant(0x90u32, 8).build()])?;
    /// assert_eq!(table.len(), 1);
    /// # Ok::<(), ruleasm::EncodeError>(())
    /// ```
    pub fn new(mnemonic: impl Into<String>, rules: Vec<Rule>) -> Result<Self, EncodeError> {
        Self::with_options(mnemonic, rules, TableOptions::default())
    }

    /// Build and validate a table with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedRule`] for the first invalid rule.
    pub fn with_options(
        mnemonic: impl Into<String>,
        rules: Vec<Rule>,
        options: TableOptions,
    ) -> Result<Self, EncodeError> {
        let table = Self {
            mnemonic: mnemonic.into(),
            rules,
            options,
        };
        table.validate()?;
        Ok(table)
    }

    fn malformed(&self, rule: usize, defect: RuleDefect) -> EncodeError {
        EncodeError::MalformedRule {
            mnemonic: self.mnemonic.clone(),
            rule,
            defect,
        }
    }

    fn validate(&self) -> Result<(), EncodeError> {
        let Some(first) = self.rules.first() else {
            return Err(self.malformed(0, RuleDefect::NoRules));
        };
        let expected = first.template_width();

        for (index, rule) in self.rules.iter().enumerate() {
            if !rule.mnemonic().eq_ignore_ascii_case(&self.mnemonic) {
                return Err(self.malformed(
                    index,
                    RuleDefect::MnemonicMismatch {
                        found: rule.mnemonic().to_string(),
                    },
                ));
            }
            rule.validate().map_err(|defect| self.malformed(index, defect))?;

            let found = rule.template_width();
            if found != expected && !self.options.allow_mixed_widths {
                return Err(self.malformed(index, RuleDefect::WidthMismatch { expected, found }));
            }
        }

        let conflicts = self.width_conflicts();
        if !conflicts.is_empty() {
            tracing::warn!(
                mnemonic = %self.mnemonic,
                conflicts = conflicts.len(),
                "rule table accepted with mixed template widths"
            );
        }

        Ok(())
    }

    /// The mnemonic this table encodes.
    #[must_use]
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    /// Rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rule at declaration index `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the table has no rules (never true for a validated table).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Validation options the table was built with.
    #[must_use]
    pub fn options(&self) -> TableOptions {
        self.options
    }

    /// Distinct parameter counts, ascending.
    #[must_use]
    pub fn arities(&self) -> Vec<usize> {
        let mut arities: Vec<usize> = self.rules.iter().map(Rule::arity).collect();
        arities.sort_unstable();
        arities.dedup();
        arities
    }

    /// Rules whose template width differs from the first rule's, as
    /// `(index, width)` pairs.
    #[must_use]
    pub fn width_conflicts(&self) -> Vec<(usize, u64)> {
        let Some(expected) = self.rules.first().map(Rule::template_width) else {
            return Vec::new();
        };
        self.rules
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.template_width()))
            .filter(|&(_, w)| w != expected)
            .collect()
    }

    /// Append more alternatives after the existing ones and re-validate.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedRule`] if the merged table is
    /// invalid; `self` is left unchanged in that case.
    pub fn extend(&mut self, rules: Vec<Rule>) -> Result<(), EncodeError> {
        let mut merged = self.rules.clone();
        merged.extend(rules);
        let table = Self::with_options(self.mnemonic.clone(), merged, self.options)?;
        *self = table;
        Ok(())
    }

    /// Append the alternatives of `other` and re-validate under the
    /// stricter of the two tables' options: mixed template widths survive
    /// the merge only if both tables allowed them.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedRule`] if the merged table is
    /// invalid; `self` is left unchanged in that case.
    pub fn merge(&mut self, other: RuleTable) -> Result<(), EncodeError> {
        let options = TableOptions {
            allow_mixed_widths: self.options.allow_mixed_widths
                && other.options.allow_mixed_widths,
        };
        let mut merged = self.rules.clone();
        merged.extend(other.rules);
        let table = Self::with_options(self.mnemonic.clone(), merged, options)?;
        *self = table;
        Ok(())
    }
}

/// Deserialized table, validated through [`RuleTable::with_options`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedTable {
    mnemonic: String,
    rules: Vec<Rule>,
    #[serde(default)]
    options: TableOptions,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedTable> for RuleTable {
    type Error = EncodeError;

    fn try_from(raw: UncheckedTable) -> Result<Self, Self::Error> {
        RuleTable::with_options(raw.mnemonic, raw.rules, raw.options)
    }
}

/// A named collection of rule tables, keyed by mnemonic.
///
/// Mnemonic lookup is ASCII case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedRuleSet"))]
pub struct RuleSet {
    name: String,
    tables: BTreeMap<String, RuleTable>,
}

impl RuleSet {
    /// Create an empty rule set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: BTreeMap::new(),
        }
    }

    /// The rule set's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a table. A table for an already-present mnemonic is merged via
    /// [`RuleTable::merge`]: its rules are appended after the existing ones
    /// and the stricter options apply.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedRule`] if merging produces an
    /// invalid table.
    pub fn insert(&mut self, table: RuleTable) -> Result<(), EncodeError> {
        let key = table.mnemonic().to_ascii_lowercase();
        match self.tables.get_mut(&key) {
            Some(existing) => existing.merge(table),
            None => {
                self.tables.insert(key, table);
                Ok(())
            }
        }
    }

    /// Builder-style [`insert`](Self::insert).
    ///
    /// # Errors
    ///
    /// See [`insert`](Self::insert).
    pub fn with(mut self, table: RuleTable) -> Result<Self, EncodeError> {
        self.insert(table)?;
        Ok(self)
    }

    /// Look up the table for `mnemonic`.
    #[must_use]
    pub fn get(&self, mnemonic: &str) -> Option<&RuleTable> {
        if let Some(table) = self.tables.get(mnemonic) {
            return Some(table);
        }
        self.tables.get(&mnemonic.to_ascii_lowercase())
    }

    /// Whether a table exists for `mnemonic`.
    #[must_use]
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.get(mnemonic).is_some()
    }

    /// Tables in mnemonic order.
    pub fn tables(&self) -> impl Iterator<Item = &RuleTable> {
        self.tables.values()
    }

    /// Number of mnemonics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the set has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Deserialized rule set. Map keys are not trusted: every table is
/// re-keyed by its own mnemonic through [`RuleSet::insert`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedRuleSet {
    name: String,
    tables: BTreeMap<String, RuleTable>,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedRuleSet> for RuleSet {
    type Error = EncodeError;

    fn try_from(raw: UncheckedRuleSet) -> Result<Self, Self::Error> {
        let mut set = RuleSet::new(raw.name);
        for table in raw.tables.into_values() {
            set.insert(table)?;
        }
        Ok(set)
    }
}

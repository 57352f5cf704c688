//! Option descriptors and the table the parser walks.
//!
//! A table borrows its value slots from the caller. The parser only ever
//! writes into those slots; reading them back after a successful parse is the
//! caller's business.

use serde::Serialize;
use std::cell::{Cell, RefCell};
use thiserror::Error;

/// Errors for a malformed option table, detected before any token is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("option #{index} has neither a short nor a long name")]
    Unnamed { index: usize },

    #[error("option #{index} has invalid short name {name:?}")]
    InvalidShortName { index: usize, name: char },

    #[error("option #{index} has invalid long name {name:?}")]
    InvalidLongName { index: usize, name: String },
}

/// Whether and how an option consumes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPolicy {
    /// Plain flag, never takes a value.
    None,
    /// Takes a value if one is available, otherwise binds an empty one.
    Optional,
    /// Must be given a value.
    Required,
}

/// Policy of a value-bearing slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValuePolicy {
    Optional,
    Required,
}

/// A value bound to an option during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoundValue {
    /// The option was given with the `+` prefix.
    pub negated: bool,
    pub value: String,
}

impl BoundValue {
    pub fn new(negated: bool, value: impl Into<String>) -> Self {
        Self {
            negated,
            value: value.into(),
        }
    }

    /// The prefix character the option was invoked with.
    pub fn prefix(&self) -> char {
        if self.negated {
            '+'
        } else {
            '-'
        }
    }
}

/// Caller-owned storage an option writes into.
#[derive(Debug, Clone, Copy)]
pub enum Slot<'a> {
    Flag(&'a Cell<bool>),
    Value(&'a RefCell<Option<BoundValue>>, ValuePolicy),
}

impl Slot<'_> {
    pub fn policy(&self) -> ArgPolicy {
        match self {
            Slot::Flag(_) => ArgPolicy::None,
            Slot::Value(_, ValuePolicy::Optional) => ArgPolicy::Optional,
            Slot::Value(_, ValuePolicy::Required) => ArgPolicy::Required,
        }
    }
}

/// One declared option.
#[derive(Debug, Clone)]
pub struct OptionDescriptor<'a> {
    pub short: Option<char>,
    pub long: Option<String>,
    pub slot: Slot<'a>,
    /// The short form also accepts `+x` to unset.
    pub negatable: bool,
    /// Placeholder shown by the usage formatter, e.g. `line` in `-c line`.
    pub value_name: Option<String>,
    pub description: Option<String>,
}

impl<'a> OptionDescriptor<'a> {
    fn with_slot(slot: Slot<'a>) -> Self {
        Self {
            short: None,
            long: None,
            slot,
            negatable: false,
            value_name: None,
            description: None,
        }
    }

    /// A flag that is set by `-x`/`--name` and cleared by `+x`.
    pub fn flag(cell: &'a Cell<bool>) -> Self {
        Self::with_slot(Slot::Flag(cell))
    }

    /// An option whose value may be omitted.
    pub fn optional(cell: &'a RefCell<Option<BoundValue>>) -> Self {
        Self::with_slot(Slot::Value(cell, ValuePolicy::Optional))
    }

    /// An option that must be followed by a value.
    pub fn required(cell: &'a RefCell<Option<BoundValue>>) -> Self {
        Self::with_slot(Slot::Value(cell, ValuePolicy::Required))
    }

    pub fn short(mut self, c: char) -> Self {
        self.short = Some(c);
        self
    }

    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.long = Some(name.into());
        self
    }

    pub fn negatable(mut self) -> Self {
        self.negatable = true;
        self
    }

    pub fn value_name(mut self, name: impl Into<String>) -> Self {
        self.value_name = Some(name.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn policy(&self) -> ArgPolicy {
        self.slot.policy()
    }

    pub fn takes_value(&self) -> bool {
        self.policy() != ArgPolicy::None
    }

    /// Name used in diagnostics: the long form if there is one.
    pub fn display_name(&self) -> String {
        match (&self.long, self.short) {
            (Some(long), _) => format!("--{}", long),
            (None, Some(short)) => format!("-{}", short),
            (None, None) => String::from("<unnamed>"),
        }
    }

    fn validate(&self, index: usize) -> Result<(), TableError> {
        if self.short.is_none() && self.long.is_none() {
            return Err(TableError::Unnamed { index });
        }

        if let Some(c) = self.short {
            if matches!(c, '-' | '+' | '=') || c.is_whitespace() {
                return Err(TableError::InvalidShortName { index, name: c });
            }
        }

        if let Some(ref long) = self.long {
            if long.is_empty()
                || long.starts_with('-')
                || long.contains('=')
                || long.chars().any(char::is_whitespace)
            {
                return Err(TableError::InvalidLongName {
                    index,
                    name: long.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Ordered set of option descriptors.
///
/// Lookups scan in declaration order and the first match wins; duplicate
/// names are not rejected.
#[derive(Debug, Clone, Default)]
pub struct OptionTable<'a> {
    options: Vec<OptionDescriptor<'a>>,
}

impl<'a> OptionTable<'a> {
    pub fn new(options: Vec<OptionDescriptor<'a>>) -> Self {
        Self { options }
    }

    pub fn push(&mut self, option: OptionDescriptor<'a>) {
        self.options.push(option);
    }

    pub fn options(&self) -> &[OptionDescriptor<'a>] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OptionDescriptor<'a>> {
        self.options.iter()
    }

    /// Check every descriptor before parsing starts.
    pub fn validate(&self) -> Result<(), TableError> {
        for (index, option) in self.options.iter().enumerate() {
            option.validate(index)?;
        }
        Ok(())
    }
}

impl<'a> FromIterator<OptionDescriptor<'a>> for OptionTable<'a> {
    fn from_iter<I: IntoIterator<Item = OptionDescriptor<'a>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'t, 'a> IntoIterator for &'t OptionTable<'a> {
    type Item = &'t OptionDescriptor<'a>;
    type IntoIter = std::slice::Iter<'t, OptionDescriptor<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

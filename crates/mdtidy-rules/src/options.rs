//! Typed rule options and the builders that describe them
//!
//! Every configurable field of a rule's options record gets one
//! [`OptionBuilder`]. A builder knows the field's key, how to describe it to
//! a settings renderer, its default, how to validate an incoming value and
//! how to write that value into the record.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::OptionError;

/// A raw option value as supplied by a host (config file, settings UI)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(i64),
    Text(String),
}

impl OptionValue {
    /// Name of the value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "boolean",
            OptionValue::Number(_) => "number",
            OptionValue::Text(_) => "text",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Number(n) => write!(f, "{}", n),
            OptionValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// Option overrides keyed by option key
pub type OptionValues = BTreeMap<String, OptionValue>;

/// Rendering-agnostic description of one option
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescriptor {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub default_value: OptionValue,
}

/// A boolean toggle bound to one field of the options record `O`
pub struct BooleanOption<O> {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub get: fn(&O) -> bool,
    pub set: fn(&mut O, bool),
}

/// The closed set of option kinds a rule can expose
pub enum OptionBuilder<O> {
    Boolean(BooleanOption<O>),
}

impl<O: Default> OptionBuilder<O> {
    /// Build a boolean toggle
    pub fn boolean(
        key: &'static str,
        display_name: &'static str,
        description: &'static str,
        get: fn(&O) -> bool,
        set: fn(&mut O, bool),
    ) -> Self {
        OptionBuilder::Boolean(BooleanOption {
            key,
            display_name,
            description,
            get,
            set,
        })
    }

    pub fn key(&self) -> &'static str {
        match self {
            OptionBuilder::Boolean(option) => option.key,
        }
    }

    /// Metadata for a settings renderer
    pub fn describe(&self) -> OptionDescriptor {
        match self {
            OptionBuilder::Boolean(option) => OptionDescriptor {
                key: option.key,
                display_name: option.display_name,
                description: option.description,
                default_value: self.default_value(),
            },
        }
    }

    /// The value this option has in `O::default()`
    pub fn default_value(&self) -> OptionValue {
        self.value_of(&O::default())
    }

    /// Read this option's current value out of a record
    pub fn value_of(&self, options: &O) -> OptionValue {
        match self {
            OptionBuilder::Boolean(option) => OptionValue::Bool((option.get)(options)),
        }
    }

    /// Check that `value` has the type this option expects
    pub fn validate(&self, value: &OptionValue) -> Result<(), OptionError> {
        match (self, value) {
            (OptionBuilder::Boolean(_), OptionValue::Bool(_)) => Ok(()),
            (OptionBuilder::Boolean(option), other) => Err(OptionError::TypeMismatch {
                key: option.key.to_string(),
                expected: "boolean",
                found: other.type_name(),
            }),
        }
    }

    /// Validate `value` and write it into `options`
    pub fn assign(&self, options: &mut O, value: &OptionValue) -> Result<(), OptionError> {
        self.validate(value)?;
        if let (OptionBuilder::Boolean(option), OptionValue::Bool(b)) = (self, value) {
            (option.set)(options, *b);
        }
        Ok(())
    }
}

/// Build a fresh options record: defaults merged with `overrides`
pub fn merge_options<O: Default>(
    builders: &[OptionBuilder<O>],
    overrides: &OptionValues,
) -> Result<O, OptionError> {
    let mut options = O::default();

    for (key, value) in overrides {
        let builder = builders
            .iter()
            .find(|b| b.key() == key.as_str())
            .ok_or_else(|| OptionError::UnknownOption { key: key.clone() })?;
        builder.assign(&mut options, value)?;
    }

    Ok(options)
}

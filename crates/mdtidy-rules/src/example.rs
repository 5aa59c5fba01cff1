//! Rule examples: documentation that is also a regression fixture

use serde::Serialize;
use thiserror::Error;

use crate::error::RuleError;
use crate::options::{OptionValue, OptionValues};
use crate::rule::Rule;

/// A before/after pair showing what a rule does under some options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Example {
    pub description: &'static str,
    pub before: &'static str,
    pub after: &'static str,
    /// Overrides applied on top of the rule's defaults
    pub options: OptionValues,
}

/// An example whose rule output does not match its expected text
#[derive(Error, Debug)]
pub enum ExampleFailure {
    #[error("example '{description}' of rule '{rule}' does not match\n  expected: {expected:?}\n  actual:   {actual:?}")]
    Mismatch {
        rule: &'static str,
        description: &'static str,
        expected: String,
        actual: String,
    },

    #[error("example '{description}' of rule '{rule}' could not run: {source}")]
    Rejected {
        rule: &'static str,
        description: &'static str,
        #[source]
        source: RuleError,
    },
}

impl Example {
    pub fn new(description: &'static str, before: &'static str, after: &'static str) -> Self {
        Self {
            description,
            before,
            after,
            options: OptionValues::new(),
        }
    }

    /// Add an option override for this example
    pub fn with_option(mut self, key: &str, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Run `rule` on `before` and compare with `after`
    pub fn verify<R: Rule + ?Sized>(&self, rule: &R) -> Result<(), ExampleFailure> {
        let actual = rule
            .apply(self.before, &self.options)
            .map_err(|source| ExampleFailure::Rejected {
                rule: rule.alias(),
                description: self.description,
                source,
            })?;

        if actual == self.after {
            Ok(())
        } else {
            Err(ExampleFailure::Mismatch {
                rule: rule.alias(),
                description: self.description,
                expected: self.after.to_string(),
                actual,
            })
        }
    }
}

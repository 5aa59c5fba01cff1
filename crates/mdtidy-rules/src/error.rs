//! Error types for rule configuration and the lint pipeline

use thiserror::Error;

/// Errors raised while merging option overrides into a rule's options
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionError {
    #[error("unknown option '{key}'")]
    UnknownOption { key: String },

    #[error("option '{key}' expects a {expected} value, got {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised by the rule catalog and lint pipeline
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("unknown rule '{0}'")]
    UnknownRule(String),

    #[error("rule '{0}' is already registered")]
    DuplicateRule(&'static str),

    #[error("invalid options for rule '{rule}': {source}")]
    Option {
        rule: &'static str,
        #[source]
        source: OptionError,
    },

    #[error("invalid YAML frontmatter: {0}")]
    InvalidFrontmatter(#[from] serde_yaml::Error),
}

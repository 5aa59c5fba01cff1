//! Per-document rule opt-out through the `disabled rules` frontmatter key
//!
//! ```text
//! ---
//! disabled rules: [heading-blank-lines]
//! ---
//! ```
//!
//! The value `all` switches every rule off for the document.

use std::collections::BTreeSet;

use mdtidy_core::Frontmatter;
use serde_yaml::Value;

use crate::error::RuleError;

pub const DISABLED_RULES_KEY: &str = "disabled rules";

/// Rules a document has opted out of
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisabledRules {
    #[default]
    None,
    All,
    Some(BTreeSet<String>),
}

impl DisabledRules {
    pub fn contains(&self, alias: &str) -> bool {
        match self {
            DisabledRules::None => false,
            DisabledRules::All => true,
            DisabledRules::Some(aliases) => aliases.contains(alias),
        }
    }
}

/// Read the `disabled rules` entry from the document's frontmatter
///
/// A scalar or a list of scalars is accepted. Fails only when the
/// frontmatter is not valid YAML.
pub fn disabled_rules(text: &str) -> Result<DisabledRules, RuleError> {
    let Some(frontmatter) = Frontmatter::find(text) else {
        return Ok(DisabledRules::None);
    };

    let body = frontmatter.body_str(text);
    if body.trim().is_empty() {
        return Ok(DisabledRules::None);
    }

    let value: Value = serde_yaml::from_str(body)?;
    let aliases: Vec<String> = match value.get(DISABLED_RULES_KEY) {
        Some(Value::String(alias)) => vec![alias.clone()],
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    if aliases.iter().any(|alias| alias == "all") {
        Ok(DisabledRules::All)
    } else if aliases.is_empty() {
        Ok(DisabledRules::None)
    } else {
        Ok(DisabledRules::Some(aliases.into_iter().collect()))
    }
}

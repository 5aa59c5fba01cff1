//! Rule registry and lint pipeline
//!
//! The registry collects rules, looks them up by alias or name and runs the
//! enabled ones over a document in registration order.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use mdtidy_core::logging;
use serde::Serialize;

use crate::disabled::disabled_rules;
use crate::error::RuleError;
use crate::heading_blank_lines;
use crate::options::OptionValues;
use crate::rule::{Rule, RuleCategory};

/// Log name for documents linted without a path
const ANONYMOUS_DOCUMENT: &str = "<text>";

/// Information about a registered rule
#[derive(Debug, Clone, Serialize)]
pub struct RuleInfo {
    pub name: &'static str,
    pub alias: &'static str,
    pub description: &'static str,
    pub category: RuleCategory,
    pub option_count: usize,
    pub example_count: usize,
}

/// Registry of available rules
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    by_alias: HashMap<&'static str, usize>,
    by_name: HashMap<&'static str, usize>,
}

/// How one rule should run during a lint
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSettings {
    pub enabled: bool,
    pub options: OptionValues,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            options: OptionValues::new(),
        }
    }
}

/// Per-rule settings for a lint, keyed by alias
#[derive(Debug, Clone, PartialEq)]
pub struct LintSettings {
    pub rules: BTreeMap<String, RuleSettings>,
    /// Whether rules without an entry in `rules` run with their defaults
    pub run_unlisted: bool,
}

impl Default for LintSettings {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            run_unlisted: true,
        }
    }
}

impl LintSettings {
    /// Run only the given rules, with their defaults
    pub fn only<'a>(aliases: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            rules: aliases
                .into_iter()
                .map(|alias| (alias.to_string(), RuleSettings::default()))
                .collect(),
            run_unlisted: false,
        }
    }

    pub fn with_rule(mut self, alias: &str, settings: RuleSettings) -> Self {
        self.rules.insert(alias.to_string(), settings);
        self
    }

    /// Whether `alias` runs, and with which overrides
    fn resolve<'a>(&'a self, alias: &str, empty: &'a OptionValues) -> (bool, &'a OptionValues) {
        match self.rules.get(alias) {
            Some(settings) => (settings.enabled, &settings.options),
            None => (self.run_unlisted, empty),
        }
    }
}

/// Result of linting one document
#[derive(Debug, Clone, PartialEq)]
pub struct LintOutcome {
    pub text: String,
    /// Aliases of rules that changed the text, in run order
    pub changed: Vec<&'static str>,
    /// Aliases of enabled rules the document's frontmatter switched off
    pub skipped: Vec<&'static str>,
}

impl LintOutcome {
    pub fn is_changed(&self) -> bool {
        !self.changed.is_empty()
    }
}

impl RuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            by_alias: HashMap::new(),
            by_name: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in rule
    pub fn with_builtin_rules() -> Result<Self, RuleError> {
        let mut registry = Self::new();
        register_builtin_rules(&mut registry)?;
        Ok(registry)
    }

    /// Register a rule; aliases must be unique
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<(), RuleError> {
        if self.by_alias.contains_key(rule.alias()) {
            return Err(RuleError::DuplicateRule(rule.alias()));
        }

        let idx = self.rules.len();
        self.by_alias.insert(rule.alias(), idx);
        self.by_name.insert(rule.name(), idx);
        self.rules.push(rule);
        Ok(())
    }

    /// Get a rule by its alias
    pub fn get(&self, alias: &str) -> Option<&Arc<dyn Rule>> {
        self.by_alias.get(alias).map(|&idx| &self.rules[idx])
    }

    /// Get a rule by its display name
    pub fn get_by_name(&self, name: &str) -> Option<&Arc<dyn Rule>> {
        self.by_name.get(name).map(|&idx| &self.rules[idx])
    }

    /// Get a rule by alias, falling back to its display name
    pub fn lookup(&self, name: &str) -> Result<&Arc<dyn Rule>, RuleError> {
        self.get(name)
            .or_else(|| self.get_by_name(name))
            .ok_or_else(|| RuleError::UnknownRule(name.to_string()))
    }

    /// Get all rules in registration order
    pub fn all(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn aliases(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.alias()).collect()
    }

    /// Get information about all rules
    pub fn list(&self) -> Vec<RuleInfo> {
        self.rules
            .iter()
            .map(|r| RuleInfo {
                name: r.name(),
                alias: r.alias(),
                description: r.description(),
                category: r.category(),
                option_count: r.options().len(),
                example_count: r.examples().len(),
            })
            .collect()
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules `settings` enables
    pub fn enabled_count(&self, settings: &LintSettings) -> usize {
        let empty = OptionValues::new();
        self.rules
            .iter()
            .filter(|r| settings.resolve(r.alias(), &empty).0)
            .count()
    }

    /// Run every enabled rule over `text`
    ///
    /// Each rule sees the output of the one before it. Rules listed in the
    /// document's `disabled rules` frontmatter entry are skipped.
    pub fn lint(&self, text: &str, settings: &LintSettings) -> Result<LintOutcome, RuleError> {
        self.lint_document(ANONYMOUS_DOCUMENT, text, settings)
    }

    /// Like [`lint`](Self::lint), naming the document in the debug log
    pub fn lint_document(
        &self,
        document: &str,
        text: &str,
        settings: &LintSettings,
    ) -> Result<LintOutcome, RuleError> {
        if let Some(unknown) = settings.rules.keys().find(|alias| self.get(alias).is_none()) {
            return Err(RuleError::UnknownRule(unknown.clone()));
        }

        let disabled = disabled_rules(text)?;
        let empty = OptionValues::new();
        let mut outcome = LintOutcome {
            text: text.to_string(),
            changed: Vec::new(),
            skipped: Vec::new(),
        };

        for rule in &self.rules {
            let alias = rule.alias();
            let (enabled, overrides) = settings.resolve(alias, &empty);
            if !enabled {
                continue;
            }

            if disabled.contains(alias) {
                logging::log_rule_skipped(document, alias, "disabled in frontmatter");
                outcome.skipped.push(alias);
                continue;
            }

            let updated = rule.apply(&outcome.text, overrides)?;
            let changed = updated != outcome.text;
            logging::log_rule_result(document, alias, changed);

            if changed {
                outcome.changed.push(alias);
                outcome.text = updated;
            }
        }

        Ok(outcome)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Register every built-in rule
pub fn register_builtin_rules(registry: &mut RuleRegistry) -> Result<(), RuleError> {
    heading_blank_lines::register(registry)?;
    Ok(())
}

/// The process-wide catalog of built-in rules, built on first use
pub fn catalog() -> &'static RuleRegistry {
    static CATALOG: OnceLock<RuleRegistry> = OnceLock::new();
    CATALOG.get_or_init(|| {
        RuleRegistry::with_builtin_rules().expect("built-in rule aliases are unique")
    })
}

//! The rule trait and the declarative descriptor that implements it

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::RuleError;
use crate::example::{Example, ExampleFailure};
use crate::options::{merge_options, OptionBuilder, OptionDescriptor, OptionValues};

/// Grouping used when listing rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    Yaml,
    Heading,
    Footnote,
    Content,
    Spacing,
    Paste,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::Yaml => "yaml",
            RuleCategory::Heading => "heading",
            RuleCategory::Footnote => "footnote",
            RuleCategory::Content => "content",
            RuleCategory::Spacing => "spacing",
            RuleCategory::Paste => "paste",
        }
    }
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Markdown rule as seen by the catalog and the lint pipeline
///
/// Options cross this boundary as raw [`OptionValues`]; each rule validates
/// them against its own option builders.
pub trait Rule: Send + Sync {
    /// Human-readable name, e.g. "Heading blank lines"
    fn name(&self) -> &'static str;

    /// Kebab-case identifier, unique within a catalog
    fn alias(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn category(&self) -> RuleCategory;

    /// Descriptors for every configurable option
    fn options(&self) -> Vec<OptionDescriptor>;

    /// Default value of every option, keyed by option key
    fn default_values(&self) -> OptionValues {
        self.options()
            .into_iter()
            .map(|option| (option.key.to_string(), option.default_value))
            .collect()
    }

    fn examples(&self) -> &[Example];

    /// Transform `text` with the defaults merged with `overrides`
    fn apply(&self, text: &str, overrides: &OptionValues) -> Result<String, RuleError>;

    /// Run every example and collect the ones that fail
    fn verify_examples(&self) -> Vec<ExampleFailure> {
        self.examples()
            .iter()
            .filter_map(|example| example.verify(self).err())
            .collect()
    }
}

/// A typed options record for one rule
pub trait RuleOptions: Clone + Default + Send + Sync + 'static {}

impl<T: Clone + Default + Send + Sync + 'static> RuleOptions for T {}

/// The pure transformation a descriptor wraps
pub type ApplyFn<O> = fn(&str, &O) -> String;

/// A rule assembled from metadata, option builders, examples and a
/// transformation over the typed options record `O`
pub struct RuleDescriptor<O: RuleOptions> {
    name: &'static str,
    alias: &'static str,
    description: &'static str,
    category: RuleCategory,
    options: Vec<OptionBuilder<O>>,
    examples: Vec<Example>,
    apply: ApplyFn<O>,
}

impl<O: RuleOptions> RuleDescriptor<O> {
    pub fn new(
        name: &'static str,
        alias: &'static str,
        description: &'static str,
        category: RuleCategory,
        apply: ApplyFn<O>,
    ) -> Self {
        Self {
            name,
            alias,
            description,
            category,
            options: Vec::new(),
            examples: Vec::new(),
            apply,
        }
    }

    /// Expose one field of `O` as a configurable option
    pub fn option(mut self, builder: OptionBuilder<O>) -> Self {
        self.options.push(builder);
        self
    }

    pub fn example(mut self, example: Example) -> Self {
        self.examples.push(example);
        self
    }

    pub fn default_options(&self) -> O {
        O::default()
    }

    pub fn option_builders(&self) -> &[OptionBuilder<O>] {
        &self.options
    }

    /// Merge `overrides` into a fresh defaults record
    pub fn resolve(&self, overrides: &OptionValues) -> Result<O, RuleError> {
        merge_options(&self.options, overrides).map_err(|source| RuleError::Option {
            rule: self.alias,
            source,
        })
    }

    /// Run the transformation with an already-built options record
    pub fn apply_typed(&self, text: &str, options: &O) -> String {
        (self.apply)(text, options)
    }
}

impl<O: RuleOptions> Rule for RuleDescriptor<O> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn alias(&self) -> &'static str {
        self.alias
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn category(&self) -> RuleCategory {
        self.category
    }

    fn options(&self) -> Vec<OptionDescriptor> {
        self.options.iter().map(OptionBuilder::describe).collect()
    }

    fn examples(&self) -> &[Example] {
        &self.examples
    }

    fn apply(&self, text: &str, overrides: &OptionValues) -> Result<String, RuleError> {
        let options = self.resolve(overrides)?;
        Ok(self.apply_typed(text, &options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptionError;
    use crate::options::OptionValue;

    #[derive(Debug, Clone, Default)]
    struct ShoutOptions {
        shout: bool,
    }

    fn shout(text: &str, options: &ShoutOptions) -> String {
        if options.shout {
            text.to_uppercase()
        } else {
            text.to_string()
        }
    }

    fn descriptor() -> RuleDescriptor<ShoutOptions> {
        RuleDescriptor::new("Shout", "shout", "Uppercase text", RuleCategory::Content, shout)
            .option(OptionBuilder::boolean(
                "shout",
                "Shout",
                "Uppercase everything",
                |o: &ShoutOptions| o.shout,
                |o: &mut ShoutOptions, v| o.shout = v,
            ))
            .example(Example::new("Defaults leave text alone", "abc", "abc"))
            .example(Example::new("Shouting", "abc", "ABC").with_option("shout", true))
    }

    #[test]
    fn test_metadata() {
        let rule = descriptor();

        assert_eq!(rule.name(), "Shout");
        assert_eq!(rule.alias(), "shout");
        assert_eq!(rule.category(), RuleCategory::Content);
        assert_eq!(rule.options().len(), 1);
        assert_eq!(rule.examples().len(), 2);
        assert_eq!(
            rule.default_values().get("shout"),
            Some(&OptionValue::Bool(false))
        );
    }

    #[test]
    fn test_apply_merges_overrides() {
        let rule = descriptor();
        let mut overrides = OptionValues::new();

        assert_eq!(rule.apply("hi", &overrides).unwrap(), "hi");

        overrides.insert("shout".to_string(), true.into());
        assert_eq!(rule.apply("hi", &overrides).unwrap(), "HI");
    }

    #[test]
    fn test_apply_rejects_bad_overrides() {
        let rule = descriptor();
        let mut overrides = OptionValues::new();
        overrides.insert("whisper".to_string(), true.into());

        match rule.apply("hi", &overrides) {
            Err(RuleError::Option { rule, source }) => {
                assert_eq!(rule, "shout");
                assert!(matches!(source, OptionError::UnknownOption { .. }));
            }
            other => panic!("expected option error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_examples_reports_mismatch() {
        let rule = descriptor().example(Example::new("Wrong", "abc", "xyz"));
        let failures = rule.verify_examples();

        assert_eq!(failures.len(), 1, "only the wrong example should fail");
        assert!(matches!(
            &failures[0],
            ExampleFailure::Mismatch { description: "Wrong", .. }
        ));
    }

    #[test]
    fn test_verify_examples_reports_rejected_options() {
        let rule = descriptor().example(Example::new("Bad", "a", "a").with_option("shout", "yes"));
        let failures = rule.verify_examples();

        assert_eq!(failures.len(), 1);
        assert!(failures[0].to_string().contains("could not run"));
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        assert_eq!(RuleCategory::Spacing.to_string(), "spacing");
        assert_eq!(
            serde_yaml::to_string(&RuleCategory::Yaml).unwrap().trim(),
            "yaml"
        );
    }
}

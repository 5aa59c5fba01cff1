//! mdtidy-rules: Declarative Markdown rules
//!
//! A rule pairs a pure text transformation with metadata: a name and
//! kebab-case alias, a description, a category, typed options exposed
//! through option builders, and examples that double as documentation and
//! regression fixtures.
//!
//! # Example
//!
//! ```ignore
//! use mdtidy_rules::{catalog, LintSettings};
//!
//! let outcome = catalog().lint("# Title\ntext", &LintSettings::default())?;
//! assert_eq!(outcome.text, "# Title\n\ntext");
//! ```

pub mod disabled;
mod error;
pub mod example;
pub mod heading_blank_lines;
pub mod options;
pub mod registry;
pub mod rule;

pub use disabled::{disabled_rules, DisabledRules};
pub use error::{OptionError, RuleError};
pub use example::{Example, ExampleFailure};
pub use heading_blank_lines::HeadingBlankLinesOptions;
pub use options::{merge_options, BooleanOption, OptionBuilder, OptionDescriptor, OptionValue, OptionValues};
pub use registry::{catalog, register_builtin_rules, LintOutcome, LintSettings, RuleInfo, RuleRegistry, RuleSettings};
pub use rule::{Rule, RuleCategory, RuleDescriptor, RuleOptions};

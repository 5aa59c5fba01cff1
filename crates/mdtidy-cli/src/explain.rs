//! Rule catalog listings: `--list-rules`, `--explain` and `--verify-examples`

use colored::*;
use mdtidy_rules::{OptionValues, Rule, RuleRegistry};

/// Print every rule with its alias and category
pub fn print_rule_list(registry: &RuleRegistry) {
    println!("{}", "Available rules:".bold());
    for info in registry.list() {
        println!(
            "  {} [{}] - {}",
            info.alias.green(),
            info.category,
            info.description
        );
    }
}

/// Print a rule's metadata, options and examples
pub fn print_explanation(rule: &dyn Rule) {
    println!("{} ({})", rule.name().bold(), rule.alias().green());
    println!("{}: {}", "Category".bold(), rule.category());
    println!();
    println!("{}", rule.description());

    let options = rule.options();
    if !options.is_empty() {
        println!();
        println!("{}", "Options".bold().underline());
        for option in options {
            println!(
                "  {} (default: {}) - {}",
                option.key.cyan(),
                option.default_value,
                option.description
            );
        }
    }

    for (i, example) in rule.examples().iter().enumerate() {
        println!();
        println!("{} {}: {}", "Example".bold(), i + 1, example.description);
        if !example.options.is_empty() {
            println!("  {}: {}", "Options".dimmed(), format_overrides(&example.options));
        }
        println!("  {}", "Before:".dimmed());
        print_block(example.before);
        println!("  {}", "After:".dimmed());
        print_block(example.after);
    }
}

/// Run every catalog example, print the outcome and return the failure count
pub fn verify_examples(registry: &RuleRegistry) -> usize {
    let mut failed = 0;

    for rule in registry.all() {
        let failures = rule.verify_examples();
        if failures.is_empty() {
            println!(
                "  {} {} ({} examples)",
                "OK".green(),
                rule.alias(),
                rule.examples().len()
            );
        } else {
            for failure in &failures {
                println!("  {} {}", "FAIL".red(), failure);
            }
        }
        failed += failures.len();
    }

    failed
}

fn format_overrides(options: &OptionValues) -> String {
    options
        .iter()
        .map(|(key, value)| format!("{} = {}", key, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_block(text: &str) {
    for line in text.split('\n') {
        println!("    {} {}", "|".dimmed(), line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdtidy_rules::OptionValue;

    #[test]
    fn test_format_overrides() {
        let mut options = OptionValues::new();
        options.insert("emptyLineInBlankSections".to_string(), OptionValue::Bool(false));
        options.insert("bottom".to_string(), OptionValue::Bool(false));

        assert_eq!(
            format_overrides(&options),
            "bottom = false, emptyLineInBlankSections = false"
        );
    }

    #[test]
    fn test_catalog_examples_verify() {
        assert_eq!(verify_examples(mdtidy_rules::catalog()), 0);
    }
}

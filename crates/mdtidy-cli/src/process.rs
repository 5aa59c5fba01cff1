//! File processing logic for mdtidy

use anyhow::{Context, Result};
use mdtidy_core::logging;
use mdtidy_rules::{LintSettings, Rule, RuleRegistry};
use std::path::Path;

use crate::output::{ChangeInfo, FileResult};

/// Result of processing a single file
#[derive(Debug)]
pub struct ProcessResult {
    /// Report entry for the file
    pub report: FileResult,
    /// Original file contents
    pub old_source: String,
    /// Fixed contents (only if some rule changed the file)
    pub new_source: Option<String>,
}

/// Lint a single Markdown file
pub fn process_file(
    path: &Path,
    registry: &RuleRegistry,
    settings: &LintSettings,
) -> Result<ProcessResult> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;

    let document = path.display().to_string();
    logging::log_lint_start(&document, registry.enabled_count(settings));

    let outcome = registry
        .lint_document(&document, &source, settings)
        .with_context(|| format!("Failed to lint {}", path.display()))?;

    let changes: Vec<ChangeInfo> = outcome
        .changed
        .iter()
        .map(|alias| ChangeInfo {
            rule: alias.to_string(),
            name: registry
                .get(alias)
                .map_or_else(|| alias.to_string(), |rule| rule.name().to_string()),
        })
        .collect();
    let skipped = outcome.skipped.iter().map(|alias| alias.to_string()).collect();

    let line = first_difference(&source, &outcome.text)
        .map(|offset| offset_to_line_column(&source, offset).0);
    let new_source = outcome.is_changed().then_some(outcome.text);

    Ok(ProcessResult {
        report: FileResult::success(path, changes, line, skipped),
        old_source: source,
        new_source,
    })
}

/// Write the processed result to the file
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Byte offset of the first character where `old` and `new` differ
fn first_difference(old: &str, new: &str) -> Option<usize> {
    let mut old_chars = old.char_indices();
    let mut new_chars = new.chars();

    loop {
        match (old_chars.next(), new_chars.next()) {
            (Some((_, a)), Some(b)) if a == b => continue,
            (Some((i, _)), _) => return Some(i),
            (None, Some(_)) => return Some(old.len()),
            (None, None) => return None,
        }
    }
}

/// Convert byte offset to line and column numbers (1-based)
fn offset_to_line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

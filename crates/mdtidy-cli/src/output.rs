//! Reporting for mdtidy
//!
//! Every file ends in one [`Outcome`]. The [`Reporter`] tallies outcomes and
//! prints them as colored text, a unified diff or one JSON document.

use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::Path;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Diff,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<OutputFormat> {
        match s.to_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "diff" => Some(OutputFormat::Diff),
            _ => None,
        }
    }
}

/// A rule that changed a document
#[derive(Debug, Clone, Serialize)]
pub struct ChangeInfo {
    pub rule: String,
    pub name: String,
}

/// Per-file entry of the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct FileResult {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changes: Vec<ChangeInfo>,
    /// First line (1-based) where the fixed text differs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Rules the document's frontmatter switched off
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileResult {
    pub fn success(path: &Path, changes: Vec<ChangeInfo>, line: Option<usize>, skipped: Vec<String>) -> Self {
        Self {
            path: path.display().to_string(),
            changes,
            line,
            skipped,
            error: None,
        }
    }

    pub fn error(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            changes: Vec::new(),
            line: None,
            skipped: Vec::new(),
            error: Some(error),
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What happened to one file
#[derive(Debug, Clone, Copy)]
pub enum Outcome<'a> {
    /// Check mode: the file would be rewritten from `old` to `new`
    Pending { old: &'a str, new: &'a str },
    /// Fix mode: the file was rewritten
    Fixed,
    /// No rule changed the file
    Clean,
    /// The file could not be read or linted
    Failed,
}

/// Totals over every reported file
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Summary {
    pub files_processed: usize,
    pub files_with_changes: usize,
    pub total_changes: usize,
    pub errors: usize,
}

impl Summary {
    fn add(&mut self, result: &FileResult) {
        self.files_processed += 1;
        if result.has_error() {
            self.errors += 1;
        }
        if result.has_changes() {
            self.files_with_changes += 1;
            self.total_changes += result.changes.len();
        }
    }

    fn print_text(&self, check_mode: bool) {
        println!();
        println!("{}", "Summary".bold().underline());
        println!(
            "  {} file(s), {} changed, {} rule change(s)",
            self.files_processed, self.files_with_changes, self.total_changes
        );
        if self.errors > 0 {
            println!("  {} error(s)", self.errors.to_string().red());
        }
        if check_mode && self.files_with_changes > 0 {
            println!();
            println!("{}", "Run with --fix to apply changes".yellow());
        }
    }
}

/// The `--format json` document
#[derive(Debug, Serialize)]
pub struct JsonOutput {
    pub version: String,
    pub summary: Summary,
    pub files: Vec<FileResult>,
}

/// Accumulates file outcomes and prints them in the chosen format
pub struct Reporter {
    format: OutputFormat,
    verbose: bool,
    results: Vec<FileResult>,
    summary: Summary,
}

impl Reporter {
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self {
            format,
            verbose,
            results: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Record one file; text and diff output are printed straight away
    pub fn record(&mut self, result: FileResult, outcome: Outcome<'_>) {
        self.summary.add(&result);

        match self.format {
            OutputFormat::Text => self.print_text(&result, outcome),
            OutputFormat::Diff => {
                if let Outcome::Pending { old, new } = outcome {
                    print_unified_diff(&result.path, old, new);
                }
            }
            OutputFormat::Json => {}
        }

        self.results.push(result);
    }

    fn print_text(&self, result: &FileResult, outcome: Outcome<'_>) {
        match outcome {
            Outcome::Pending { old, new } => {
                println!("{}", result.path.bold());
                print_line_diff(old, new);
                self.print_rules(result);
            }
            Outcome::Fixed => {
                println!("{} {}", "Fixed".green(), result.path.bold());
                self.print_rules(result);
            }
            Outcome::Clean if self.verbose => {
                println!("{} {}", "Clean".dimmed(), result.path);
                self.print_skipped(result);
            }
            Outcome::Clean => {}
            Outcome::Failed => {
                eprintln!(
                    "{}: {} - {}",
                    "Warning".yellow(),
                    result.path,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    fn print_rules(&self, result: &FileResult) {
        if let Some(line) = result.line {
            println!("  {} line {}", "first change at".dimmed(), line);
        }
        for change in &result.changes {
            println!("  {} {} ({})", "->".green(), change.name, change.rule.dimmed());
        }
        self.print_skipped(result);
        println!();
    }

    fn print_skipped(&self, result: &FileResult) {
        if self.verbose {
            for rule in &result.skipped {
                println!("  {} {} (disabled in frontmatter)", "-".yellow(), rule);
            }
        }
    }

    /// Print the closing summary, or the whole JSON document
    pub fn finish(self, check_mode: bool) -> Result<()> {
        match self.format {
            OutputFormat::Text => self.summary.print_text(check_mode),
            OutputFormat::Json => {
                let output = JsonOutput {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    summary: self.summary,
                    files: self.results,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Diff => {}
        }
        Ok(())
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }
}

/// Changed lines only, with blank lines shown as `⏎`
fn print_line_diff(old: &str, new: &str) {
    for line in diff::lines(old, new) {
        match line {
            diff::Result::Left(l) => println!("  {}", format!("- {}", visible(l)).red()),
            diff::Result::Right(r) => println!("  {}", format!("+ {}", visible(r)).green()),
            diff::Result::Both(..) => {}
        }
    }
}

fn visible(line: &str) -> &str {
    if line.trim().is_empty() {
        "⏎"
    } else {
        line
    }
}

/// `diff -u` compatible output, applicable with `patch -p1`
fn print_unified_diff(path: &str, old: &str, new: &str) {
    print!("{}", unified_diff(path, old, new));
}

fn unified_diff(path: &str, old: &str, new: &str) -> String {
    similar::TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", path), &format!("b/{}", path))
        .to_string()
}

//! mdtidy CLI - rule-based Markdown formatter
//!
//! Available rules:
//! - heading-blank-lines: One blank line before and after each heading

mod config;
mod explain;
mod output;
mod process;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use mdtidy_core::logging;
use mdtidy_rules::catalog;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use config::Config;
use output::{FileResult, Outcome, OutputFormat, Reporter};
use process::{process_file, write_file, ProcessResult};

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

#[derive(Parser)]
#[command(name = "mdtidy")]
#[command(version)]
#[command(about = "A rule-based Markdown formatter")]
struct Cli {
    /// Files or directories to process
    #[arg(required_unless_present_any = ["list_rules", "explain", "verify_examples"])]
    paths: Vec<PathBuf>,

    /// Check for issues without applying fixes (default mode)
    #[arg(long, conflicts_with = "fix")]
    check: bool,

    /// Apply fixes to files
    #[arg(long, conflicts_with = "check")]
    fix: bool,

    /// Show verbose output
    #[arg(long, short = 'v')]
    verbose: bool,

    /// Rules to run (can be specified multiple times). Overrides config file.
    #[arg(long, short = 'r', value_name = "RULE")]
    rule: Vec<String>,

    /// Output format: text, json, diff
    #[arg(long, value_name = "FORMAT")]
    format: Option<String>,

    /// Shorthand for --format json
    #[arg(long, conflicts_with = "format")]
    json: bool,

    /// Path to config file (default: auto-detect .mdtidy.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ignore config files
    #[arg(long, conflicts_with = "config")]
    no_config: bool,

    /// List available rules and exit
    #[arg(long)]
    list_rules: bool,

    /// Describe a rule, its options and examples, and exit
    #[arg(long, value_name = "RULE")]
    explain: Option<String>,

    /// Run every rule's examples and exit
    #[arg(long)]
    verify_examples: bool,

    /// Write a debug log to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log_file {
        logging::init_logger(Some(log_path))
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    }

    let registry = catalog();

    if cli.list_rules {
        explain::print_rule_list(registry);
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(name) = &cli.explain {
        let rule = registry.lookup(name)?;
        explain::print_explanation(rule.as_ref());
        return Ok(ExitCode::SUCCESS);
    }

    if cli.verify_examples {
        let failed = explain::verify_examples(registry);
        return Ok(if failed > 0 {
            eprintln!("{}: {} example(s) failed", "Error".red(), failed);
            ExitCode::from(1)
        } else {
            ExitCode::SUCCESS
        });
    }

    let (config, config_path) = load_config(&cli)?;

    let format_name = if cli.json {
        Some("json")
    } else {
        cli.format.as_deref().or(config.output.format.as_deref())
    };
    let output_format = match format_name {
        Some(name) => OutputFormat::from_str(name).ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid output format '{}'. Valid options: text, json, diff",
                name
            )
        })?,
        None => OutputFormat::Text,
    };
    let verbose_text = cli.verbose && output_format == OutputFormat::Text;

    if let Some(path) = &config_path {
        if verbose_text {
            println!("{}: {}", "Using config".bold(), path.display());
        }
    }

    let settings = config.lint_settings(registry, &cli.rule)?;
    let enabled: Vec<&str> = registry
        .aliases()
        .into_iter()
        .filter(|alias| settings.rules.get(*alias).is_some_and(|s| s.enabled))
        .collect();

    if enabled.is_empty() {
        eprintln!("{}: No rules enabled", "Error".red());
        return Ok(ExitCode::from(1));
    }

    // Determine mode: fix or check (check is default)
    let fix_mode = cli.fix;
    let check_mode = !fix_mode;

    if verbose_text {
        println!(
            "{}: {}",
            "Mode".bold(),
            if fix_mode { "fix" } else { "check" }
        );
        println!("{}: {}", "Rules".bold(), enabled.join(", "));
        println!();
    }

    let (mut file_paths, missing_paths) = collect_files(&cli.paths, &config);
    file_paths.sort();
    file_paths.dedup();

    // Process files in parallel; results keep the sorted path order
    let results: Vec<Result<ProcessResult>> = file_paths
        .par_iter()
        .map(|path| process_file(path, registry, &settings))
        .collect();

    let mut reporter = Reporter::new(output_format, cli.verbose);

    for path in &missing_paths {
        if output_format == OutputFormat::Text {
            eprintln!(
                "{}: Path does not exist: {}",
                "Warning".yellow(),
                path.display()
            );
        }
    }

    for (path, result) in file_paths.iter().zip(results) {
        report_result(path, result, fix_mode, &mut reporter)?;
    }

    let summary = reporter.summary();
    logging::log_lint_complete(
        summary.files_processed,
        summary.files_with_changes,
        summary.errors,
    );

    let exit_code = if summary.errors > 0 {
        ExitCode::from(1)
    } else if check_mode && summary.files_with_changes > 0 {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    };

    reporter.finish(check_mode)?;

    Ok(exit_code)
}

fn load_config(cli: &Cli) -> Result<(Config, Option<PathBuf>)> {
    if cli.no_config {
        return Ok((Config::default(), None));
    }

    let loaded = match &cli.config {
        Some(path) => Some((Config::load_path(path)?, path.clone())),
        None => Config::load()?,
    };

    Ok(match loaded {
        Some((config, path)) => {
            logging::log_config_load(&path);
            (config, Some(path))
        }
        None => (Config::default(), None),
    })
}

/// Expand the given paths into Markdown files; also return paths that do not exist
fn collect_files(paths: &[PathBuf], config: &Config) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut file_paths = Vec::new();
    let mut missing_paths = Vec::new();

    for path in paths {
        if path.is_file() {
            file_paths.push(path.clone());
        } else if path.is_dir() {
            for entry in walkdir::WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            {
                let file_path = entry.path();
                if !config.should_exclude(file_path) {
                    file_paths.push(file_path.to_path_buf());
                }
            }
        } else {
            missing_paths.push(path.clone());
        }
    }

    (file_paths, missing_paths)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MARKDOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Report a file result and optionally apply fixes
fn report_result(
    path: &Path,
    result: Result<ProcessResult>,
    fix_mode: bool,
    reporter: &mut Reporter,
) -> Result<()> {
    match result {
        Ok(ProcessResult {
            report,
            old_source,
            new_source: Some(new_source),
        }) => {
            if fix_mode {
                write_file(path, &new_source)?;
                reporter.record(report, Outcome::Fixed);
            } else {
                let outcome = Outcome::Pending {
                    old: &old_source,
                    new: &new_source,
                };
                reporter.record(report, outcome);
            }
        }
        Ok(ProcessResult { report, .. }) => reporter.record(report, Outcome::Clean),
        Err(e) => reporter.record(FileResult::error(path, format!("{:#}", e)), Outcome::Failed),
    }
    Ok(())
}

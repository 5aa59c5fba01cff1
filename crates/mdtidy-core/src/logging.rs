//! Debug logging for mdtidy
//!
//! Off by default. Once the host calls [`init_logger`], the lint pipeline
//! records configuration loading, which rules ran on which document and
//! which were skipped. Rule transformations themselves never log.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Global logger instance
static LOGGER: Mutex<Option<DebugLogger>> = Mutex::new(None);

/// Timestamped line logger backed by a file
pub struct DebugLogger {
    file: File,
    path: PathBuf,
}

impl DebugLogger {
    /// Create a new logger writing to the specified path
    pub fn new(log_path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)?;

        Ok(Self {
            file,
            path: log_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a log message
    pub fn log(&mut self, message: &str) {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(self.file, "[{}] {}", timestamp, message);
        let _ = self.file.flush();
    }

    /// Log a section header
    pub fn section(&mut self, title: &str) {
        let separator = "=".repeat(60);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }

    /// Log a subsection
    pub fn subsection(&mut self, title: &str) {
        let separator = "-".repeat(40);
        self.log(&separator);
        self.log(title);
        self.log(&separator);
    }
}

/// Initialize the global logger
///
/// Without a path the log goes to `/tmp/mdtidy-<timestamp>.log`.
pub fn init_logger(log_path: Option<&Path>) -> std::io::Result<PathBuf> {
    let path = log_path.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        PathBuf::from(format!("/tmp/mdtidy-{}.log", timestamp))
    });

    let logger = DebugLogger::new(&path)?;

    if let Ok(mut guard) = LOGGER.lock() {
        *guard = Some(logger);
    }

    Ok(path)
}

/// Stop logging and close the log file
pub fn shutdown() {
    if let Ok(mut guard) = LOGGER.lock() {
        *guard = None;
    }
}

fn with_logger(f: impl FnOnce(&mut DebugLogger)) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(ref mut logger) = *guard {
            f(logger);
        }
    }
}

/// Log a message to the global logger
pub fn log(message: &str) {
    with_logger(|logger| logger.log(message));
}

/// Log a section header
pub fn section(title: &str) {
    with_logger(|logger| logger.section(title));
}

/// Log a subsection
pub fn subsection(title: &str) {
    with_logger(|logger| logger.subsection(title));
}

/// Check if logging is enabled
pub fn is_enabled() -> bool {
    LOGGER.lock().map(|guard| guard.is_some()).unwrap_or(false)
}

/// Log configuration loading
pub fn log_config_load(path: &Path) {
    section("CONFIGURATION LOADING");
    log(&format!("Loading config from: {}", path.display()));
}

/// Log the start of a lint pass over one document
pub fn log_lint_start(document: &str, rule_count: usize) {
    subsection(&format!("LINT {}", document));
    log(&format!("Enabled rules: {}", rule_count));
}

/// Log the outcome of one rule on one document
///
/// Documents are linted in parallel, so every line names its document.
pub fn log_rule_result(document: &str, alias: &str, changed: bool) {
    log(&rule_result_line(document, alias, changed));
}

/// Log a rule that was not run on a document
pub fn log_rule_skipped(document: &str, alias: &str, reason: &str) {
    log(&rule_skipped_line(document, alias, reason));
}

fn rule_result_line(document: &str, alias: &str, changed: bool) -> String {
    let status = if changed { "changed" } else { "no change" };
    format!("  {}: {} - {}", document, alias, status)
}

fn rule_skipped_line(document: &str, alias: &str, reason: &str) -> String {
    format!("  {}: {} - SKIPPED ({})", document, alias, reason)
}

/// Log a finished lint run
pub fn log_lint_complete(documents: usize, changed: usize, errors: usize) {
    section("LINT COMPLETE");
    log(&format!("Documents processed: {}", documents));
    log(&format!("Documents changed: {}", changed));
    log(&format!("Errors: {}", errors));
}

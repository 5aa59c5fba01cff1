//! Configuration file support for mdtidy
//!
//! Loads `.mdtidy.toml` from current directory or parent directories.

use anyhow::{bail, Context, Result};
use mdtidy_rules::{LintSettings, OptionValues, Rule, RuleRegistry, RuleSettings};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = ".mdtidy.toml";

/// Configuration file structure
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub rules: RulesConfig,
    pub paths: PathsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// If set, only these rules will run
    pub enabled: Option<Vec<String>>,
    /// Rules to exclude (applied after enabled)
    pub disabled: Vec<String>,
    /// Option overrides per rule alias
    pub options: BTreeMap<String, OptionValues>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Glob patterns to exclude from processing
    pub exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text", "json" or "diff"
    pub format: Option<String>,
}

impl Config {
    /// Load config from `.mdtidy.toml` searching from current directory upward
    pub fn load() -> Result<Option<(Config, PathBuf)>> {
        Self::load_from(std::env::current_dir()?)
    }

    /// Load config searching from the given directory upward
    pub fn load_from(start_dir: PathBuf) -> Result<Option<(Config, PathBuf)>> {
        let mut current = Some(start_dir.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                let config = Self::load_path(&config_path)?;
                return Ok(Some((config, config_path)));
            }
            current = dir.parent();
        }

        Ok(None)
    }

    /// Load config from a specific path
    pub fn load_path(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Build lint settings from the config and `-r` rules given on the command line
    ///
    /// Rule names may be aliases or display names. CLI rules replace the
    /// `enabled`/`disabled` lists; option overrides always apply.
    pub fn lint_settings(&self, registry: &RuleRegistry, cli_rules: &[String]) -> Result<LintSettings> {
        let resolve = |name: &str| -> Result<&'static str> {
            registry.lookup(name).map(|rule| rule.alias()).with_context(|| {
                format!("Unknown rule '{}'. Use --list-rules to see available rules.", name)
            })
        };

        let enabled: HashSet<&'static str> = if !cli_rules.is_empty() {
            cli_rules.iter().map(|name| resolve(name.as_str())).collect::<Result<_>>()?
        } else {
            let mut enabled: HashSet<&'static str> = match &self.rules.enabled {
                Some(names) => names.iter().map(|name| resolve(name.as_str())).collect::<Result<_>>()?,
                None => registry.aliases().into_iter().collect(),
            };
            for name in &self.rules.disabled {
                enabled.remove(resolve(name.as_str())?);
            }
            enabled
        };

        let mut options: BTreeMap<&'static str, OptionValues> = BTreeMap::new();
        for (name, overrides) in &self.rules.options {
            let alias = resolve(name.as_str())?;
            validate_options(registry, alias, overrides)?;
            options.insert(alias, overrides.clone());
        }

        let rules = registry
            .aliases()
            .into_iter()
            .map(|alias| {
                let settings = RuleSettings {
                    enabled: enabled.contains(alias),
                    options: options.remove(alias).unwrap_or_default(),
                };
                (alias.to_string(), settings)
            })
            .collect();

        Ok(LintSettings {
            rules,
            run_unlisted: false,
        })
    }

    /// Check if a path should be excluded based on config patterns
    pub fn should_exclude(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();

        for pattern in &self.paths.exclude {
            if let Ok(glob_pattern) = glob::Pattern::new(pattern) {
                if glob_pattern.matches(&path_str) {
                    return true;
                }
                // Also try matching against just the file/dir name
                if let Some(file_name) = path.file_name() {
                    if glob_pattern.matches(&file_name.to_string_lossy()) {
                        return true;
                    }
                }
            }

            if pattern.ends_with('/') {
                let dir_pattern = pattern.trim_end_matches('/');
                if path_str.contains(&format!("/{}/", dir_pattern))
                    || path_str.starts_with(&format!("{}/", dir_pattern))
                {
                    return true;
                }
            }
        }

        false
    }
}

/// Check option keys and value types against the rule's declared options
fn validate_options(registry: &RuleRegistry, alias: &str, overrides: &OptionValues) -> Result<()> {
    let Some(rule) = registry.get(alias) else {
        bail!("Unknown rule '{}'", alias);
    };
    let declared = rule.options();

    for (key, value) in overrides {
        let Some(option) = declared.iter().find(|o| o.key == key.as_str()) else {
            bail!("Unknown option '{}' for rule '{}'", key, alias);
        };
        if option.default_value.type_name() != value.type_name() {
            bail!(
                "Option '{}' of rule '{}' expects a {} value, got {}",
                key,
                alias,
                option.default_value.type_name(),
                value.type_name()
            );
        }
    }

    Ok(())
}

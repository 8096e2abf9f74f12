//! Configuration types for treelint.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::Severity;

/// Top-level configuration.
///
/// ```toml
/// [linter]
/// report_unused_disable_directives = "warn"
///
/// [settings]
/// max_width = 100
///
/// [rules]
/// no-trailing-spaces = "error"
/// no-restricted-syntax = ["warn", "call_expression"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Engine options.
    #[serde(default)]
    pub linter: LinterConfig,

    /// Free-form settings visible to every rule.
    #[serde(default)]
    pub settings: toml::Table,

    /// Per-rule configurations, run in name order.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Adds or replaces a rule entry.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, config: impl Into<RuleConfig>) -> Self {
        self.rules.insert(name.into(), config.into());
        self
    }

    /// Sets how unused disable directives are reported.
    #[must_use]
    pub fn report_unused_disable_directives(mut self, level: ReportUnused) -> Self {
        self.linter.report_unused_disable_directives = level;
        self
    }

    /// Checks if a rule is configured and not off.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rule_severity(rule_name).is_some()
    }

    /// Gets the effective severity of a rule, `None` if off or absent.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<Severity> {
        self.rules
            .get(rule_name)
            .and_then(|c| c.severity.to_severity())
    }
}

/// Engine-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinterConfig {
    /// Whether directives that suppress nothing are reported.
    #[serde(default)]
    pub report_unused_disable_directives: ReportUnused,

    /// Ignore directive comments, warning about each one.
    #[serde(default)]
    pub no_inline_config: bool,
}

/// Configured rule severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RuleSeverity {
    /// Rule does not run.
    #[default]
    Off,
    /// Problems are warnings.
    Warn,
    /// Problems are errors.
    Error,
}

impl RuleSeverity {
    /// Severity of the problems the rule reports, `None` when off.
    #[must_use]
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            Self::Off => None,
            Self::Warn => Some(Severity::Warning),
            Self::Error => Some(Severity::Error),
        }
    }

    /// Normalizes `"off" | "warn" | "error" | 0 | 1 | 2`.
    ///
    /// # Errors
    ///
    /// Returns a message describing the rejected value.
    pub fn from_value(value: &toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "off" => Ok(Self::Off),
                "warn" => Ok(Self::Warn),
                "error" => Ok(Self::Error),
                other => Err(format!(
                    "unknown severity \"{other}\", expected \"off\", \"warn\" or \"error\""
                )),
            },
            toml::Value::Integer(0) => Ok(Self::Off),
            toml::Value::Integer(1) => Ok(Self::Warn),
            toml::Value::Integer(2) => Ok(Self::Error),
            other => Err(format!(
                "severity must be \"off\", \"warn\", \"error\", 0, 1 or 2, got {other}"
            )),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl From<Severity> for RuleSeverity {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Warning => Self::Warn,
            Severity::Error => Self::Error,
        }
    }
}

/// Reporting level for unused disable directives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "toml::Value", into = "toml::Value")]
pub enum ReportUnused {
    /// Not reported.
    #[default]
    Off,
    /// Reported as warnings.
    Warn,
    /// Reported as errors.
    Error,
}

impl ReportUnused {
    /// Severity of the synthetic problems, `None` when off.
    #[must_use]
    pub fn to_severity(self) -> Option<Severity> {
        match self {
            Self::Off => None,
            Self::Warn => Some(Severity::Warning),
            Self::Error => Some(Severity::Error),
        }
    }
}

impl TryFrom<toml::Value> for ReportUnused {
    type Error = String;

    fn try_from(value: toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::Boolean(true) => Ok(Self::Warn),
            toml::Value::Boolean(false) => Ok(Self::Off),
            other => RuleSeverity::from_value(&other).map(|s| match s {
                RuleSeverity::Off => Self::Off,
                RuleSeverity::Warn => Self::Warn,
                RuleSeverity::Error => Self::Error,
            }),
        }
    }
}

impl From<ReportUnused> for toml::Value {
    fn from(level: ReportUnused) -> Self {
        let s = match level {
            ReportUnused::Off => "off",
            ReportUnused::Warn => "warn",
            ReportUnused::Error => "error",
        };
        toml::Value::String(s.to_string())
    }
}

/// Per-rule configuration: a severity and positional options.
///
/// Written either as a bare severity (`"warn"`, `2`) or as an array whose
/// first element is the severity (`["error", { max = 3 }]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "toml::Value", into = "toml::Value")]
pub struct RuleConfig {
    /// Configured severity.
    pub severity: RuleSeverity,
    /// Options passed to the rule.
    pub options: Vec<toml::Value>,
}

impl RuleConfig {
    /// Creates a configuration without options.
    #[must_use]
    pub fn new(severity: RuleSeverity) -> Self {
        Self {
            severity,
            options: Vec::new(),
        }
    }

    /// Appends an option.
    #[must_use]
    pub fn with_option(mut self, option: impl Into<toml::Value>) -> Self {
        self.options.push(option.into());
        self
    }
}

impl From<RuleSeverity> for RuleConfig {
    fn from(severity: RuleSeverity) -> Self {
        Self::new(severity)
    }
}

impl From<Severity> for RuleConfig {
    fn from(severity: Severity) -> Self {
        Self::new(severity.into())
    }
}

impl TryFrom<toml::Value> for RuleConfig {
    type Error = String;

    fn try_from(value: toml::Value) -> Result<Self, String> {
        match value {
            toml::Value::Array(mut items) => {
                if items.is_empty() {
                    return Err("rule configuration array must start with a severity".into());
                }
                let severity = RuleSeverity::from_value(&items.remove(0))?;
                Ok(Self {
                    severity,
                    options: items,
                })
            }
            other => Ok(Self::new(RuleSeverity::from_value(&other)?)),
        }
    }
}

impl From<RuleConfig> for toml::Value {
    fn from(config: RuleConfig) -> Self {
        let severity = toml::Value::String(config.severity.as_str().to_string());
        if config.options.is_empty() {
            severity
        } else {
            let mut items = vec![severity];
            items.extend(config.options);
            toml::Value::Array(items)
        }
    }
}

/// Merges configured options over a rule's defaults, position by position.
///
/// Tables are merged key by key, recursively; any other configured value
/// replaces the default. Defaults past the configured length are kept.
#[must_use]
pub fn merge_options(defaults: &[toml::Value], configured: &[toml::Value]) -> Vec<toml::Value> {
    let len = defaults.len().max(configured.len());
    (0..len)
        .map(|i| match (defaults.get(i), configured.get(i)) {
            (Some(d), Some(c)) => merge_value(d, c),
            (Some(v), None) | (None, Some(v)) => v.clone(),
            (None, None) => toml::Value::Table(toml::Table::new()),
        })
        .collect()
}

fn merge_value(default: &toml::Value, configured: &toml::Value) -> toml::Value {
    match (default, configured) {
        (toml::Value::Table(d), toml::Value::Table(c)) => {
            let mut merged = d.clone();
            for (key, value) in c {
                let next = match d.get(key) {
                    Some(existing) => merge_value(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            toml::Value::Table(merged)
        }
        (_, c) => c.clone(),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

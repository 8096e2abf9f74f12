//! Project-level entry point: config discovery, preset resolution and a
//! ready-to-use Kotlin linter.

use std::path::{Path, PathBuf};

use tracing::debug;
use treelint_core::{
    Config, ConfigError, FixOptions, FixReport, LintError, LintOutput, Linter, VerifyOptions,
};
use treelint_rules::{all_rules, Preset};
use treelint_ts::KotlinParser;

/// Config file names to search for, in priority order.
pub const CONFIG_CANDIDATES: &[&str] = &["treelint.toml", ".treelint.toml"];

const DEFAULT_PRESET: &str = "recommended";

/// A linter paired with the configuration it runs under.
#[derive(Debug)]
pub struct Project {
    linter: Linter,
    config: Config,
}

impl Project {
    /// Builds a Kotlin project from TOML config content.
    ///
    /// The optional top-level `preset` key (`"recommended"` or `"all"`)
    /// seeds the rule table; entries under `[rules]` override it.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid config or names an
    /// unknown preset.
    pub fn kotlin(content: &str) -> Result<Self, LintError> {
        let preset = resolve_preset(content)?;
        let file = if content.trim().is_empty() {
            Config::default()
        } else {
            Config::parse(content)?
        };
        let mut config = preset.config();
        config.linter = file.linter;
        config.settings = file.settings;
        config.rules.extend(file.rules);

        let linter = Linter::builder()
            .parser(KotlinParser::new())
            .rules(all_rules())
            .build()?;
        debug!(?preset, rules = config.rules.len(), "project configured");
        Ok(Self { linter, config })
    }

    /// Loads the first config candidate found in `dir`.
    ///
    /// Falls back to the recommended preset when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn discover(dir: &Path) -> Result<Self, LintError> {
        match find_config(dir) {
            Some(path) => {
                debug!(path = %path.display(), "using config file");
                let content = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                Self::kotlin(&content)
            }
            None => Self::kotlin(""),
        }
    }

    /// The configured linter.
    #[must_use]
    pub fn linter(&self) -> &Linter {
        &self.linter
    }

    /// The effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lints `text` without fixing.
    ///
    /// # Errors
    ///
    /// Propagates rule and configuration failures.
    pub fn lint(&self, text: &str) -> Result<LintOutput, LintError> {
        self.linter.verify(text, &self.config, &VerifyOptions::default())
    }

    /// Lints `text` and applies every available fix.
    ///
    /// # Errors
    ///
    /// Propagates rule and configuration failures.
    pub fn fix(&self, text: &str) -> Result<FixReport, LintError> {
        self.linter
            .verify_and_fix(text, &self.config, &FixOptions::default())
    }
}

fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Reads the top-level `preset` key, defaulting to recommended.
fn resolve_preset(content: &str) -> Result<Preset, LintError> {
    let table: toml::Table = content.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        message: e.to_string(),
    })?;
    let name = table
        .get("preset")
        .and_then(toml::Value::as_str)
        .unwrap_or(DEFAULT_PRESET);
    match name {
        "recommended" => Ok(Preset::Recommended),
        "all" => Ok(Preset::All),
        other => Err(ConfigError::Parse {
            message: format!("unknown preset `{other}`. Valid presets: recommended, all"),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treelint_core::{RuleSeverity, Severity};

    #[test]
    fn resolve_preset_defaults_to_recommended() {
        assert_eq!(resolve_preset("").unwrap(), Preset::Recommended);
    }

    #[test]
    fn resolve_preset_from_config() {
        assert_eq!(resolve_preset("preset = \"all\"").unwrap(), Preset::All);
    }

    #[test]
    fn resolve_preset_rejects_unknown() {
        let err = resolve_preset("preset = \"strict\"").unwrap_err();
        assert!(err.to_string().contains("unknown preset `strict`"));
    }

    #[test]
    fn file_rules_override_preset() {
        let project = Project::kotlin(
            r#"
[rules]
eol-last = "off"
no-trailing-spaces = "error"
"#,
        )
        .unwrap();
        let config = project.config();
        assert!(!config.is_rule_enabled("eol-last"));
        assert_eq!(
            config.rule_severity("no-trailing-spaces"),
            Some(Severity::Error)
        );
        assert_eq!(
            config.rules["no-warning-comments"].severity,
            RuleSeverity::Warn
        );
        assert!(!config.is_rule_enabled("max-depth"));
    }

    #[test]
    fn every_rule_is_registered() {
        let project = Project::kotlin("").unwrap();
        assert_eq!(project.linter().rule_count(), all_rules().len());
    }

    #[test]
    fn discover_without_file_uses_recommended() {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::discover(dir.path()).unwrap();
        assert!(project.config().is_rule_enabled("no-trailing-spaces"));
    }

    #[test]
    fn discover_prefers_first_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("treelint.toml"), "preset = \"all\"").unwrap();
        std::fs::write(dir.path().join(".treelint.toml"), "preset = \"bogus\"").unwrap();
        let project = Project::discover(dir.path()).unwrap();
        assert!(project.config().is_rule_enabled("max-depth"));
    }
}

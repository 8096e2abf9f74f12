//! Rule presets for common configurations.

use treelint_core::{Config, RuleBox};

use crate::{EolLast, MaxDepth, NoRestrictedSyntax, NoTrailingSpaces, NoWarningComments};

/// Preset configurations for treelint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    /// Formatting rules that are safe to fix automatically.
    Recommended,
    /// Every built-in rule.
    All,
}

impl Preset {
    /// Returns the rules for this preset.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        match self {
            Self::Recommended => recommended_rules(),
            Self::All => all_rules(),
        }
    }

    /// Returns a configuration enabling every rule of the preset at its
    /// default severity.
    #[must_use]
    pub fn config(self) -> Config {
        self.rules()
            .iter()
            .fold(Config::new(), |config, rule| {
                config.rule(rule.name(), rule.default_severity())
            })
    }
}

/// Returns the recommended set of rules.
///
/// Includes:
/// - `no-trailing-spaces` (TL001) - Forbids trailing whitespace
/// - `eol-last` (TL002) - Requires a final newline
/// - `no-warning-comments` (TL003) - Flags TODO/FIXME comments
#[must_use]
pub fn recommended_rules() -> Vec<RuleBox> {
    vec![
        Box::new(NoTrailingSpaces::new()),
        Box::new(EolLast::new()),
        Box::new(NoWarningComments::new()),
    ]
}

/// Returns all available rules.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(NoTrailingSpaces::new()),
        Box::new(EolLast::new()),
        Box::new(NoWarningComments::new()),
        Box::new(NoRestrictedSyntax::new()),
        Box::new(MaxDepth::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::BraceParser;
    use treelint_core::{FixOptions, Linter, RuleSeverity, Severity};

    #[test]
    fn test_preset_rules() {
        assert!(!Preset::Recommended.rules().is_empty());
        assert_eq!(Preset::All.rules().len(), 5);
    }

    #[test]
    fn test_preset_config_uses_default_severity() {
        let config = Preset::Recommended.config();
        assert_eq!(
            config.rule_severity("no-trailing-spaces"),
            Some(Severity::Warning)
        );
        assert!(!config.is_rule_enabled("max-depth"));
        assert_eq!(
            Preset::All.config().rules["no-restricted-syntax"].severity,
            RuleSeverity::Error
        );
    }

    #[test]
    fn test_codes_and_names_are_unique() {
        let rules = all_rules();
        let mut codes: Vec<_> = rules.iter().map(|r| r.code()).collect();
        let mut names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        codes.sort_unstable();
        codes.dedup();
        names.sort_unstable();
        names.dedup();
        assert_eq!(codes.len(), rules.len());
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_recommended_fixes_formatting() {
        let linter = Linter::builder()
            .parser(BraceParser)
            .rules(Preset::Recommended.rules())
            .build()
            .unwrap();
        let report = linter
            .verify_and_fix(
                "a  \n{ b } \t",
                &Preset::Recommended.config(),
                &FixOptions::default(),
            )
            .unwrap();
        assert_eq!(report.output, "a\n{ b }\n");
        assert!(report.messages.is_empty());
    }
}

//! Timing collected when [`crate::VerifyOptions::stats`] is set.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Time spent in one lint pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassTimes {
    /// Parsing the text.
    pub parse: Duration,
    /// Per rule: creating its listeners plus running them.
    pub rules: BTreeMap<String, Duration>,
    /// Applying fixes. Zero when the pass fixed nothing.
    pub fix: Duration,
    /// The whole pass.
    pub total: Duration,
}

impl PassTimes {
    /// Sum of all rule times.
    #[must_use]
    pub fn rules_total(&self) -> Duration {
        self.rules.values().sum()
    }
}

/// Timing of a [`crate::Linter::verify_and_fix`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintStats {
    /// One entry per lint pass, including the final re-lint.
    pub passes: Vec<PassTimes>,
    /// Passes whose fixes changed the text.
    pub fix_passes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_total_sums_every_rule() {
        let mut times = PassTimes::default();
        times.rules.insert("a".into(), Duration::from_millis(2));
        times.rules.insert("b".into(), Duration::from_millis(3));
        assert_eq!(times.rules_total(), Duration::from_millis(5));
        assert_eq!(PassTimes::default().rules_total(), Duration::ZERO);
    }
}

//! Repeated lint-and-fix passes until the text stops changing.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::LintError;
use crate::fixer::{FixFilter, FixedText};
use crate::linter::{Linter, VerifyOptions};
use crate::stats::LintStats;
use crate::types::{Problem, SuppressedProblem};

/// Upper bound on lint passes in [`Linter::verify_and_fix`].
pub const MAX_AUTOFIX_PASSES: usize = 10;

/// Options for [`Linter::verify_and_fix`].
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Options for every lint pass.
    pub verify: VerifyOptions,
    /// Which fixes to apply.
    pub filter: FixFilter,
}

impl FixOptions {
    /// Creates default options: every fix applies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the lint options.
    #[must_use]
    pub fn verify(mut self, verify: VerifyOptions) -> Self {
        self.verify = verify;
        self
    }

    /// Sets the fix filter.
    #[must_use]
    pub fn filter(mut self, filter: FixFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// Non-fatal conditions met while fixing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LintWarning {
    /// Fixes kept undoing each other.
    #[error(
        "Circular fixes detected while fixing the text. It may be caused by rules with conflicting fixes."
    )]
    CircularFixes {
        /// Pass at which the loop stopped.
        passes: usize,
    },
}

/// Result of [`Linter::verify_and_fix`].
#[derive(Debug, Clone, Default)]
pub struct FixReport {
    /// Whether any pass changed the text.
    pub fixed: bool,
    /// The final text.
    pub output: String,
    /// Problems left in the final text.
    pub messages: Vec<Problem>,
    /// Problems hidden by directives in the final text.
    pub suppressed: Vec<SuppressedProblem>,
    /// Warnings raised by the loop.
    pub warnings: Vec<LintWarning>,
    /// Lint passes made, not counting the final re-lint.
    pub passes: usize,
    /// Per-pass timing, when [`VerifyOptions::stats`] is set.
    pub stats: Option<LintStats>,
}

impl Linter {
    /// Lints and fixes `text` until no fix applies, the fixes start going
    /// in circles, or [`MAX_AUTOFIX_PASSES`] is reached.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`Linter::verify`].
    pub fn verify_and_fix(
        &self,
        text: &str,
        config: &Config,
        options: &FixOptions,
    ) -> Result<FixReport, LintError> {
        let mut current = text.to_string();
        let mut previous: Option<String> = None;
        let mut fixed = false;
        let mut passes = 0;
        let mut warnings = Vec::new();
        let mut stats = options.verify.stats.then(LintStats::default);
        let mut suppressed;
        let mut result: FixedText;

        loop {
            passes += 1;
            debug!("Linting code (pass {passes})");
            let started = Instant::now();
            let output = self.verify(&current, config, &options.verify)?;
            suppressed = output.suppressed;

            debug!("Generating fixed text (pass {passes})");
            let fix_started = Instant::now();
            result = self
                .fix_applier
                .apply(&current, &output.messages, &options.filter);

            if let Some(stats) = stats.as_mut() {
                let mut times = output.times.unwrap_or_default();
                if result.fixed {
                    times.fix = fix_started.elapsed();
                    stats.fix_passes += 1;
                }
                times.total = started.elapsed();
                stats.passes.push(times);
            }

            // a parse failure leaves nothing to fix
            if output.messages.len() == 1 && output.messages[0].fatal {
                break;
            }

            fixed |= result.fixed;
            let last = std::mem::replace(&mut current, result.output.clone());
            let second_previous = previous.replace(last);

            if passes > 1 && second_previous.as_deref() == Some(current.as_str()) {
                warn!("Circular fixes detected after pass {passes}. Exiting fix loop.");
                warnings.push(LintWarning::CircularFixes { passes });
                break;
            }
            if !result.fixed || passes >= MAX_AUTOFIX_PASSES {
                break;
            }
        }

        let messages = if result.fixed {
            let output = self.verify(&current, config, &options.verify)?;
            suppressed = output.suppressed;
            if let (Some(stats), Some(times)) = (stats.as_mut(), output.times) {
                stats.passes.push(times);
            }
            output.messages
        } else {
            result.remaining
        };

        Ok(FixReport {
            fixed,
            output: current,
            messages,
            suppressed,
            warnings,
            passes,
            stats,
        })
    }
}

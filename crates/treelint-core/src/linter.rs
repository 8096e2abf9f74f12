//! The linter: parsing, rule dispatch and suppression for one text.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{merge_options, Config, ReportUnused};
use crate::context::{ActiveRule, CreateContext};
use crate::directive::{collect_directives, inline_config_warnings, Directive};
use crate::error::LintError;
use crate::fixer::{FixApplier, SourceCodeFixer};
use crate::parser::SourceParser;
use crate::registry::{Dispatcher, ListenerRegistry};
use crate::report::Report;
use crate::rule::{Rule, RuleBox};
use crate::selector::{ClassMatcher, SelectorCache};
use crate::source::SourceCode;
use crate::stats::PassTimes;
use crate::suppression::{apply_disable_directives, SuppressionInput};
use crate::traverse::{self, EventGenerator, Step, Traverser, END_OF_FILE};
use crate::tree::Node;
use crate::types::{LintOutput, Problem, Severity};

const BOM: char = '\u{feff}';

/// Predicate deciding which configured rules run.
pub type RuleFilter = Arc<dyn Fn(&str, Severity) -> bool + Send + Sync>;

/// Per-call options for [`Linter::verify`].
#[derive(Clone)]
pub struct VerifyOptions {
    /// Read directive comments. When false they are ignored silently.
    pub allow_inline_config: bool,
    /// Overrides `linter.report_unused_disable_directives` from the config.
    pub report_unused_disable_directives: Option<ReportUnused>,
    /// Drop fixes and suggestions from every problem.
    pub disable_fixes: bool,
    /// Runs only the rules accepted by the predicate.
    pub rule_filter: Option<RuleFilter>,
    /// Time parsing and every rule, see [`LintOutput::times`].
    pub stats: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            allow_inline_config: true,
            report_unused_disable_directives: None,
            disable_fixes: false,
            rule_filter: None,
            stats: false,
        }
    }
}

impl VerifyOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables directive comments.
    #[must_use]
    pub fn allow_inline_config(mut self, allow: bool) -> Self {
        self.allow_inline_config = allow;
        self
    }

    /// Overrides unused directive reporting.
    #[must_use]
    pub fn report_unused_disable_directives(mut self, level: ReportUnused) -> Self {
        self.report_unused_disable_directives = Some(level);
        self
    }

    /// Drops fixes and suggestions.
    #[must_use]
    pub fn disable_fixes(mut self, disable: bool) -> Self {
        self.disable_fixes = disable;
        self
    }

    /// Restricts which rules run.
    #[must_use]
    pub fn rule_filter(
        mut self,
        filter: impl Fn(&str, Severity) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.rule_filter = Some(Arc::new(filter));
        self
    }

    /// Collects timing for each pass.
    #[must_use]
    pub fn stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }
}

impl fmt::Debug for VerifyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("allow_inline_config", &self.allow_inline_config)
            .field(
                "report_unused_disable_directives",
                &self.report_unused_disable_directives,
            )
            .field("disable_fixes", &self.disable_fixes)
            .field("rule_filter", &self.rule_filter.as_ref().map(|_| ".."))
            .field("stats", &self.stats)
            .finish()
    }
}

/// Builder for configuring a [`Linter`].
#[derive(Default)]
pub struct LinterBuilder {
    parser: Option<Box<dyn SourceParser>>,
    rules: Vec<RuleBox>,
    flags: BTreeSet<String>,
    fix_applier: Option<Box<dyn FixApplier>>,
}

impl LinterBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source parser.
    #[must_use]
    pub fn parser<P: SourceParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Adds a rule.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules.
    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleBox>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Enables a feature flag visible to rules.
    #[must_use]
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Replaces the default [`SourceCodeFixer`].
    #[must_use]
    pub fn fix_applier<A: FixApplier + 'static>(mut self, applier: A) -> Self {
        self.fix_applier = Some(Box::new(applier));
        self
    }

    /// Builds the linter.
    ///
    /// # Errors
    ///
    /// Returns an error if no parser was set or two rules share a name.
    pub fn build(self) -> Result<Linter, LintError> {
        let parser = self.parser.ok_or(LintError::MissingParser)?;
        let mut index = HashMap::new();
        for (i, rule) in self.rules.iter().enumerate() {
            if index.insert(rule.name(), i).is_some() {
                return Err(LintError::DuplicateRule {
                    name: rule.name().to_string(),
                });
            }
        }
        info!(
            language = parser.language(),
            rules = self.rules.len(),
            "Linter ready"
        );
        Ok(Linter {
            parser,
            rules: self.rules,
            index,
            flags: self.flags,
            fix_applier: self
                .fix_applier
                .unwrap_or_else(|| Box::new(SourceCodeFixer)),
            selectors: SelectorCache::new(),
        })
    }
}

/// Lints texts with a fixed set of rules.
///
/// Use [`Linter::builder()`] to construct an instance. A linter can be
/// shared between threads; every call keeps its own registry and report.
pub struct Linter {
    parser: Box<dyn SourceParser>,
    rules: Vec<RuleBox>,
    index: HashMap<&'static str, usize>,
    flags: BTreeSet<String>,
    pub(crate) fix_applier: Box<dyn FixApplier>,
    selectors: SelectorCache,
}

impl fmt::Debug for Linter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Linter")
            .field("language", &self.parser.language())
            .field("rules", &self.rules.iter().map(|r| r.name()).collect::<Vec<_>>())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

impl Linter {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> LinterBuilder {
        LinterBuilder::new()
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Looks up a rule by name.
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&dyn Rule> {
        self.index.get(name).map(|&i| self.rules[i].as_ref())
    }

    /// Whether a rule with this name is registered.
    #[must_use]
    pub fn has_rule(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Whether a feature flag is enabled.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    /// Selectors compiled so far.
    #[must_use]
    pub fn selector_cache(&self) -> &SelectorCache {
        &self.selectors
    }

    /// Lints `text`.
    ///
    /// A parse failure is reported as a single fatal problem.
    ///
    /// # Errors
    ///
    /// Returns an error if a selector is invalid, a rule fails to load or
    /// a listener fails.
    pub fn verify(
        &self,
        text: &str,
        config: &Config,
        options: &VerifyOptions,
    ) -> Result<LintOutput, LintError> {
        let started = options.stats.then(Instant::now);
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let parsed = self.parser.parse(text);
        let parse_time = started.map(|t| t.elapsed()).unwrap_or_default();
        let times = |rules: BTreeMap<String, Duration>| {
            started.map(|t| PassTimes {
                parse: parse_time,
                rules,
                fix: Duration::ZERO,
                total: t.elapsed(),
            })
        };
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!(language = self.parser.language(), error = %e, "parse failed");
                let mut report = Report::new(true);
                report.add_fatal(
                    format!("Parsing error: {}", e.message),
                    e.position.line,
                    e.position.column + 1,
                );
                return Ok(LintOutput {
                    messages: report.into_problems(),
                    suppressed: Vec::new(),
                    times: times(BTreeMap::new()),
                });
            }
        };
        let source = SourceCode::new(text, parsed);
        let mut report = Report::new(options.disable_fixes);

        let mut directives: Vec<Directive> = Vec::new();
        if options.allow_inline_config {
            if config.linter.no_inline_config {
                for problem in inline_config_warnings(&source) {
                    report.push(problem);
                }
            } else {
                let extraction = collect_directives(&source, |id| self.has_rule(id));
                for problem in extraction.problems {
                    report.push(problem);
                }
                directives = extraction.directives;
            }
        }

        let rule_times = self.run_rules(&source, config, options, &mut report)?;

        let mut problems = report.into_problems();
        problems.sort_by(Problem::cmp_location);
        let report_unused = options
            .report_unused_disable_directives
            .unwrap_or(config.linter.report_unused_disable_directives);
        let result = apply_disable_directives(SuppressionInput {
            problems,
            directives: &directives,
            report_unused,
            disable_fixes: options.disable_fixes,
            text: source.text(),
        });
        debug!(
            problems = result.problems.len(),
            suppressed = result.suppressed.len(),
            "lint finished"
        );
        Ok(LintOutput {
            messages: result.problems,
            suppressed: result.suppressed,
            times: times(rule_times),
        })
    }

    /// Runs the configured rules. Returns per-rule times when stats are on.
    fn run_rules(
        &self,
        source: &SourceCode,
        config: &Config,
        options: &VerifyOptions,
        report: &mut Report,
    ) -> Result<BTreeMap<String, Duration>, LintError> {
        let mut active: Vec<ActiveRule> = Vec::new();
        let mut defs: Vec<&dyn Rule> = Vec::new();
        for (name, rule_config) in &config.rules {
            let Some(severity) = rule_config.severity.to_severity() else {
                continue;
            };
            if let Some(filter) = &options.rule_filter {
                if !filter(name, severity) {
                    debug!("Skipping filtered rule: {}", name);
                    continue;
                }
            }
            let Some(rule) = self.rule(name) else {
                warn!(rule = %name, "Rule definition not found");
                report.push(Problem::new(
                    Some(name.clone()),
                    Severity::Error,
                    format!("Definition for rule '{name}' was not found."),
                    1,
                    1,
                ));
                continue;
            };
            let meta = rule.meta();
            let rule_options = merge_options(&meta.default_options, &rule_config.options);
            active.push(ActiveRule::new(name.clone(), severity, meta, rule_options));
            defs.push(rule);
        }
        debug!(rules = active.len(), "running rules");

        let mut timings = options.stats.then(|| vec![Duration::ZERO; active.len()]);
        let mut registry = ListenerRegistry::new();
        for (slot, (entry, rule)) in active.iter().zip(&defs).enumerate() {
            let started = Instant::now();
            let ctx = CreateContext::new(entry, source, &config.settings, &self.flags);
            let listeners = rule.create(&ctx).map_err(|e| LintError::RuleLoad {
                rule_id: entry.id().to_string(),
                source: Box::new(e),
            })?;
            if let Some(timings) = timings.as_mut() {
                timings[slot] += started.elapsed();
            }
            registry.register(slot, listeners);
        }

        let generator = EventGenerator::new(registry.selectors(), &self.selectors)?;
        let mut steps = traverse::steps(source.tree());
        steps.push(Step::Call {
            event: END_OF_FILE.to_string(),
            args: vec![Value::from(source.line_count())],
        });

        let classes: ClassMatcher<'_> =
            &|class: &str, node: Node<'_>| self.parser.matches_class(class, node);
        let mut dispatcher = Dispatcher {
            registry: &mut registry,
            rules: &active,
            source,
            settings: &config.settings,
            report,
            timings: timings.as_deref_mut(),
        };
        Traverser::new(&generator, classes).run(source.tree(), &steps, &mut dispatcher)?;

        Ok(timings
            .map(|timings| {
                active
                    .iter()
                    .map(|rule| rule.id().to_string())
                    .zip(timings)
                    .collect()
            })
            .unwrap_or_default())
    }
}

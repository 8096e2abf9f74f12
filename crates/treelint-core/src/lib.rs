//! # treelint-core
//!
//! Core engine for selector-driven linting over generic syntax trees.
//!
//! This crate provides:
//!
//! - [`Rule`] trait: rules subscribe to CSS-like [`Selector`]s and call
//!   paths, and report [`Problem`]s through a [`RuleContext`]
//! - [`Linter`]: parses text through a [`SourceParser`], walks the tree
//!   and dispatches events to listeners in specificity order
//! - inline directive comments (`treelint-disable`, `treelint-enable`,
//!   `treelint-disable-line`, `treelint-disable-next-line`) with
//!   unused-directive reporting
//! - [`Linter::verify_and_fix`]: the multi-pass autofix loop
//!
//! ## Example
//!
//! ```ignore
//! use treelint_core::{Config, Linter, RuleSeverity, VerifyOptions};
//!
//! let linter = Linter::builder()
//!     .parser(MyParser)
//!     .rule(NoDebugger)
//!     .build()?;
//!
//! let config = Config::new().rule("no-debugger", RuleSeverity::Error);
//! let output = linter.verify(text, &config, &VerifyOptions::default())?;
//! println!("{}", output.format_report());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod autofix;
mod config;
mod context;
mod directive;
mod error;
mod fixer;
mod linter;
mod parser;
mod registry;
mod report;
mod rule;
mod source;
mod stats;
mod suppression;
mod traverse;
mod tree;
mod types;

/// Selector parsing, matching and specificity.
pub mod selector;

pub use autofix::{FixOptions, FixReport, LintWarning, MAX_AUTOFIX_PASSES};
pub use config::{
    merge_options, Config, ConfigError, LinterConfig, ReportUnused, RuleConfig, RuleSeverity,
};
pub use context::{ActiveRule, CreateContext, RuleContext};
pub use directive::{
    collect_directives, inline_config_warnings, Directive, DirectiveComment, DirectiveExtraction,
    DirectiveKind, RuleToken,
};
pub use error::{LintError, TreeError};
pub use fixer::{FixApplier, FixFilter, FixedText, SourceCodeFixer};
pub use linter::{Linter, LinterBuilder, RuleFilter, VerifyOptions};
pub use parser::{default_class_match, ParseError, SourceParser};
pub use registry::{EventArgs, Listener, ListenerRegistry, Listeners};
pub use report::{interpolate, merge_fixes, Descriptor, Report, SuggestionDescriptor};
pub use rule::{FixableKind, Rule, RuleBox, RuleMeta};
pub use selector::{ClassMatcher, Selector, SelectorCache};
pub use source::{Comment, CommentKind, LineIndex, ParsedSource, SourceCode};
pub use stats::{LintStats, PassTimes};
pub use suppression::{apply_disable_directives, SuppressionInput, SuppressionResult};
pub use traverse::{steps, EventGenerator, EventSink, Step, Traverser, END_OF_FILE};
pub use tree::{
    ChildSlot, Node, NodeId, Position, SourceLocation, TextRange, Tree, TreeBuilder, VisitorKeys,
};
pub use types::{
    Fix, LintOutput, Problem, ProblemDiagnostic, Severity, Suggestion, SuppressedProblem,
    Suppression, SuppressionKind,
};

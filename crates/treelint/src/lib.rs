//! # treelint
//!
//! Selector-driven linter with inline suppression and multi-pass autofix.
//!
//! This is the main facade crate that re-exports the engine, the built-in
//! rules and the tree-sitter parsers.
//!
//! ## Quick Start
//!
//! ```toml
//! # treelint.toml
//! preset = "recommended"
//!
//! [linter]
//! report_unused_disable_directives = "warn"
//!
//! [rules]
//! no-restricted-syntax = ["error", "call_expression"]
//! ```
//!
//! ```rust,ignore
//! let project = treelint::Project::discover(Path::new("."))?;
//! let report = project.fix(&source)?;
//! std::fs::write(path, &report.output)?;
//! ```
//!
//! ## Suppression Comments
//!
//! ```kotlin
//! // treelint-disable-next-line no-warning-comments -- tracked in JIRA-12
//! // TODO: split this class
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub use treelint_core::*;

/// Built-in rules and presets.
pub mod rules {
    pub use treelint_rules::*;
}

/// Tree-sitter parsers.
pub mod parsers {
    pub use treelint_ts::*;
}

mod project;

pub use project::{Project, CONFIG_CANDIDATES};

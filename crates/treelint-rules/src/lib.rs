//! # treelint-rules
//!
//! Built-in lint rules for treelint.
//!
//! These rules only rely on text, comments and selectors, so they work with
//! any [`treelint_core::SourceParser`].
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | TL001 | `no-trailing-spaces` | Forbids whitespace at the end of lines (fixable) |
//! | TL002 | `eol-last` | Requires or forbids a final newline (fixable) |
//! | TL003 | `no-warning-comments` | Flags `TODO`/`FIXME` comments (suggestions) |
//! | TL004 | `no-restricted-syntax` | Forbids syntax matched by configured selectors |
//! | TL005 | `max-depth` | Limits block nesting |
//!
//! ## Usage
//!
//! ```ignore
//! use treelint_core::Linter;
//! use treelint_rules::Preset;
//!
//! let linter = Linter::builder()
//!     .parser(MyParser)
//!     .rules(Preset::All.rules())
//!     .build()?;
//! let output = linter.verify(text, &Preset::Recommended.config(), &Default::default())?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod eol_last;
mod max_depth;
mod no_restricted_syntax;
mod no_trailing_spaces;
mod no_warning_comments;
mod presets;

#[cfg(test)]
mod test_support;

pub use eol_last::EolLast;
pub use max_depth::MaxDepth;
pub use no_restricted_syntax::NoRestrictedSyntax;
pub use no_trailing_spaces::NoTrailingSpaces;
pub use no_warning_comments::NoWarningComments;
pub use presets::{all_rules, recommended_rules, Preset};

/// Re-export core types for convenience.
pub use treelint_core::{Problem, Rule, Severity};

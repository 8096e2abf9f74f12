//! # treelint-ts
//!
//! Tree-sitter backed [`SourceParser`](treelint_core::SourceParser)s.
//!
//! A tree-sitter parse is converted into a treelint [`Tree`](treelint_core::Tree):
//!
//! - every named node becomes a tree node of the same kind
//! - children hang in the [`CHILDREN`] slot, fields are kept per node
//! - named leaves carry their source in the [`TEXT`] attribute
//! - comment nodes are collected separately for directive handling
//!
//! Syntax errors surface as a [`ParseError`](treelint_core::ParseError), which
//! the linter reports as a single fatal problem.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod convert;
mod kotlin;

pub use convert::{convert, CHILDREN, TEXT};
pub use kotlin::KotlinParser;

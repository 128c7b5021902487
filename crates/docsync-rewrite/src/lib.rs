//! Docusaurus compatibility rewrites for markdown documentation.
//!
//! This crate holds the ordered sequence of text transformations that make
//! GitHub-flavoured docs render under Docusaurus' MDX parser, and a rewriter
//! that applies them to every markdown file in a content directory.

pub mod links;
pub mod rewriter;
pub mod rules;

pub use links::is_internal_doc_target;
pub use rewriter::{FileError, FileOutcome, Mode, RewriteError, RewriteSummary, Rewriter};
pub use rules::{RuleSet, Step};

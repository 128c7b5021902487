//! Fetch and build-verification stages for docsync.
//!
//! The fetcher pulls the docs subtree of a remote branch into the site's
//! content directory; the verifier runs the site build and decides whether it
//! produced output. Both drive external tools through [`command`].

pub mod command;
pub mod fetcher;
pub mod preflight;
pub mod verifier;

pub use command::{CommandError, CommandOutput, CommandSpec};
pub use fetcher::{fetch_docs, FetchConfig, FetchError, FetchSummary};
pub use preflight::{check_project_root, PreflightError, DEFAULT_MARKERS};
pub use verifier::{verify_build, BuildOutcome, BuildReport, VerifyConfig, VerifyError, SUCCESS_MARKER};

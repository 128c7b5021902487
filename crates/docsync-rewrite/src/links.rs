//! Link target classification.
//!
//! Docs written for GitHub link to sibling pages by bare name (`backup-restore`)
//! or by file (`setup.md`). Docusaurus serves them under `/docs/`, so those
//! targets are rewritten while assets and external links are left alone.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Prefix under which Docusaurus serves the docs.
pub const DOCS_ROUTE: &str = "/docs/";

/// Extensions that still denote a doc page rather than an asset.
const PAGE_EXTENSIONS: [&str; 2] = [".md", ".html"];

/// Check whether a link target looks like a reference to another doc page.
///
/// Absolute paths, fragments, and anything with a URI scheme are external.
/// Otherwise a target is internal when it has no dot at all, or when it ends
/// in a page extension. `image.png` is an asset and stays as written.
pub fn is_internal_doc_target(target: &str) -> bool {
    static SCHEME: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("Invalid URI scheme regex")
    });

    if target.starts_with(['/', '#']) || target.starts_with("http") || SCHEME.is_match(target) {
        return false;
    }

    !target.contains('.') || PAGE_EXTENSIONS.iter().any(|ext| target.ends_with(ext))
}

/// Replacement for a `](target)` match: route internal targets under `/docs/`.
pub(crate) fn route_bare_link(caps: &Captures<'_>) -> String {
    let target = &caps[1];
    if is_internal_doc_target(target) {
        format!("]({}{})", DOCS_ROUTE, target)
    } else {
        caps[0].to_string()
    }
}

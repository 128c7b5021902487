//! Ordered rewrite rules.
//!
//! Each [`Step`] is a pure text transformation. The steps of a [`RuleSet`] run
//! in a fixed order because later ones rely on the output of earlier ones:
//! `.md` suffixes are stripped before relative links are routed, and routed
//! links are classified before doubled `/docs/docs/` prefixes are collapsed.

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::links::route_bare_link;

/// Canonical "back to top" link.
const BACK_TO_TOP: &str = "**[\u{2B06}\u{FE0F} Back to Top](#)**";

static DOCUSAURUS: LazyLock<RuleSet> = LazyLock::new(RuleSet::build_docusaurus);

/// How a regex match is replaced.
#[derive(Clone, Copy)]
enum Replacement {
    /// Replacement template, `${1}` style
    Template(&'static str),
    /// Computed from the match
    With(fn(&Captures<'_>) -> String),
}

enum Action {
    Replace {
        pattern: Regex,
        replacement: Replacement,
    },
    Custom(fn(&str) -> String),
}

/// A single named transformation step.
pub struct Step {
    name: &'static str,
    action: Action,
}

impl Step {
    fn replace(name: &'static str, pattern: &str, template: &'static str) -> Self {
        Self::regex(name, pattern, Replacement::Template(template))
    }

    fn replace_with(name: &'static str, pattern: &str, f: fn(&Captures<'_>) -> String) -> Self {
        Self::regex(name, pattern, Replacement::With(f))
    }

    fn custom(name: &'static str, f: fn(&str) -> String) -> Self {
        Self {
            name,
            action: Action::Custom(f),
        }
    }

    fn regex(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("Invalid pattern for rule {}: {}", name, e));
        Self {
            name,
            action: Action::Replace {
                pattern,
                replacement,
            },
        }
    }

    /// Rule name, used in logs and tests.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply this step to `text`.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        match &self.action {
            Action::Replace {
                pattern,
                replacement: Replacement::Template(template),
            } => pattern.replace_all(text, *template),
            Action::Replace {
                pattern,
                replacement: Replacement::With(f),
            } => pattern.replace_all(text, *f),
            Action::Custom(f) => Cow::Owned(f(text)),
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of rewrite steps.
#[derive(Debug)]
pub struct RuleSet {
    steps: Vec<Step>,
}

impl RuleSet {
    /// The rules that adapt GitHub-flavoured docs to Docusaurus.
    pub fn docusaurus() -> &'static RuleSet {
        &DOCUSAURUS
    }

    /// Run every step over `text`, in order.
    pub fn apply(&self, text: &str) -> String {
        self.steps
            .iter()
            .fold(text.to_owned(), |acc, step| step.apply(&acc).into_owned())
    }

    /// Names of the steps, in application order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(Step::name)
    }

    fn build_docusaurus() -> Self {
        let steps = vec![
            Step::replace("strip-html-comments", r"(?s)<!--.*?-->", ""),
            // <p> wrappers around block markdown confuse the MDX parser
            Step::replace(
                "unwrap-block-paragraphs",
                r"(?s)<p(?:\s[^>]*)?>\s*\n(.*?)\n\s*</p>",
                "${1}",
            ),
            Step::replace(
                "unwrap-inline-paragraphs",
                r"<p(?:\s[^>]*)?>\s*(\[?!?\[.*?\].*?)\s*</p>",
                "${1}",
            ),
            Step::replace("self-close-br", r"<br\s*/?>", "<br />"),
            Step::replace("self-close-hr", r"<hr\s*/?>", "<hr />"),
            Step::replace("self-close-img", r"<img([^>]*[^/])>", "<img${1} />"),
            Step::replace(
                "strip-stargazer-chart",
                r"(?s)\[!\[Stargazers\].*?starchart\.cc[^)]*\)(?:\]\([^)]*\))?",
                "",
            ),
            Step::replace(
                "strip-contributor-chart",
                r"(?s)\[!\[Contributors\].*?contrib\.rocks[^)]*\)(?:\]\([^)]*\))?",
                "",
            ),
            Step::replace(
                "details-to-heading",
                r"<details[^>]*>\s*<summary>([^<]+)</summary>\s*",
                "### ${1}\n\n",
            ),
            Step::replace("drop-details-close", r"</details>", ""),
            Step::replace(
                "back-to-top-link",
                r"(?:\*\*)?\[\x{2B06}\x{FE0F}? Back to Top\]\([^)]*\)(?:\*\*)?",
                BACK_TO_TOP,
            ),
            Step::replace(
                "back-to-top-anchor",
                r"(?:<p(?:\s[^>]*)?>\s*)?<a[^>]*>\x{2B06}\x{FE0F}? Back to Top</a>(?:\s*</p>)?",
                BACK_TO_TOP,
            ),
            Step::replace(
                "blob-url-to-root",
                r"https://github\.com/[^/\s]+/[^/\s]+/blob/[^/\s]+/docs/([^)\s]+)",
                "/docs/${1}",
            ),
            Step::replace("strip-md-extension", r"\]\(([^)]*?)(?:\.md)+\)", "](${1})"),
            Step::replace("route-dot-relative", r"\]\(\./([^)]+)\)", "](/docs/${1})"),
            Step::replace("route-parent-relative", r"\]\(\.\./([^)]+)\)", "](/docs/${1})"),
            Step::replace("route-docs-relative", r"\]\(docs/([^)]+)\)", "](/docs/${1})"),
            Step::replace_with("route-bare-links", r"\]\(([^)]+)\)", route_bare_link),
            Step::replace("collapse-double-docs", r"(?:/docs){2,}/", "/docs/"),
            Step::custom("normalize-whitespace", normalize_whitespace),
        ];

        Self { steps }
    }
}

/// Collapse runs of blank lines and end the text with exactly one newline.
fn normalize_whitespace(text: &str) -> String {
    static BLANK_RUN: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank line regex"));

    let collapsed = BLANK_RUN.replace_all(text, "\n\n");
    let mut out = collapsed.trim().to_string();
    out.push('\n');
    out
}

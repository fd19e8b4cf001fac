//! Ordered path rule tables compiled from glob patterns.
//!
//! Classification is a pure function of the path and the table: the first
//! rule whose patterns match wins, and its exclusions (plus the table-wide
//! ones) can only turn that match into an ALLOW, never into another rule.

use std::borrow::Cow;

use glob::{MatchOptions, Pattern};

/// `*` crosses `/`, matching is case-sensitive.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Normalize a file path for matching: forward slashes and a leading `/`,
/// so `*/dir/*` matches both relative and absolute paths.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let slashed: Cow<'_, str> = if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    };
    if slashed.starts_with('/') {
        slashed
    } else {
        Cow::Owned(format!("/{slashed}"))
    }
}

/// A set of glob patterns; matches if any pattern does.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<Pattern>,
}

impl PathMatcher {
    /// Compile patterns. Invalid globs are skipped with a warning.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    log::warn!("ignoring invalid pattern {p:?}: {e}");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Match an already-normalized path.
    pub fn matches(&self, normalized: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(normalized, MATCH_OPTIONS))
    }
}

/// One row of a rule table: a path category and the action it maps to.
#[derive(Debug, Clone)]
pub struct Rule<A> {
    pub category: String,
    matcher: PathMatcher,
    exclude: PathMatcher,
    pub action: A,
}

impl<A> Rule<A> {
    pub fn new(category: &str, patterns: &[String], exclude: &[String], action: A) -> Self {
        Self {
            category: category.to_string(),
            matcher: PathMatcher::new(patterns),
            exclude: PathMatcher::new(exclude),
            action,
        }
    }
}

/// Result of classifying a path against a table.
#[derive(Debug, PartialEq, Eq)]
pub enum Classification<'a, A> {
    /// No rule matched: not this table's concern.
    NoMatch,
    /// A rule matched but the path is owned elsewhere.
    Excluded { category: &'a str },
    /// The first matching rule.
    Matched(&'a Rule<A>),
}

/// An ordered rule table with table-wide exclusions.
#[derive(Debug, Clone)]
pub struct RuleTable<A> {
    exclude: PathMatcher,
    rules: Vec<Rule<A>>,
}

impl<A> RuleTable<A> {
    pub fn new(exclude: &[String], rules: Vec<Rule<A>>) -> Self {
        Self {
            exclude: PathMatcher::new(exclude),
            rules,
        }
    }

    pub fn rules(&self) -> &[Rule<A>] {
        &self.rules
    }

    /// Classify a file path. First matching rule terminates evaluation.
    pub fn classify(&self, path: &str) -> Classification<'_, A> {
        let normalized = normalize_path(path);
        let Some(rule) = self.rules.iter().find(|r| r.matcher.matches(&normalized)) else {
            return Classification::NoMatch;
        };
        if self.exclude.matches(&normalized) || rule.exclude.matches(&normalized) {
            return Classification::Excluded {
                category: &rule.category,
            };
        }
        Classification::Matched(rule)
    }
}

impl<A: PartialEq> PartialEq for Rule<A> {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.action == other.action
    }
}

impl<A: Eq> Eq for Rule<A> {}

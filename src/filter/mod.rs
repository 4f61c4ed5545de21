//! Filter engine for gleaner
//!
//! A rule set is an ordered list of regular expressions plus a mode. In
//! `Allow` mode a URL passes iff at least one pattern matches; in `Deny`
//! mode a URL passes iff no pattern matches. Patterns are case-insensitive,
//! Unicode-aware, and tested as a substring search anywhere in the URL
//! string. An absent rule set means "always pass."
//!
//! Two independent rule sets exist per crawler: one gates following (entry),
//! one gates reporting (yield). They are evaluated independently on every
//! discovered URL, so a URL may be yielded without being followed, followed
//! without being yielded, both, or neither.

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

/// How a rule set's patterns are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// A URL passes iff at least one pattern matches
    Allow,
    /// A URL passes iff no pattern matches
    Deny,
}

/// An ordered set of compiled filter rules
#[derive(Debug, Clone)]
pub struct FilterRules {
    mode: FilterMode,
    patterns: Vec<Regex>,
}

impl FilterRules {
    /// Compiles a rule set from pattern strings
    ///
    /// Patterns are compiled case-insensitive with Unicode support, in the
    /// order given. Fails on the first invalid pattern.
    pub fn new<S: AsRef<str>>(mode: FilterMode, patterns: &[S]) -> Result<Self, regex::Error> {
        let patterns = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .unicode(true)
                    .build()
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { mode, patterns })
    }

    /// Checks whether a URL passes this rule set
    ///
    /// Evaluation short-circuits on the first matching pattern.
    pub fn passes(&self, url: &str) -> bool {
        let matched = self.patterns.iter().any(|p| p.is_match(url));
        match self.mode {
            FilterMode::Allow => matched,
            FilterMode::Deny => !matched,
        }
    }
}

//! Prefix matching and subpath rewriting.
//!
//! # Responsibilities
//! - Match a path against a literal prefix and strip it
//! - Rewrite the remaining path with the first applicable subpath rule
//!
//! # Design Decisions
//! - Matching is a plain string prefix test, not segment-aware:
//!   `/cloud` matches `/cloudflare/x` and leaves `flare/x`
//! - The root prefix `/` only matches the root path itself
//! - Case-sensitive, no regex, no normalisation of the path

use crate::config::PathRewrite;

/// Matches and strips a literal path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the path with the prefix removed, or `None` when it does not match.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" && path != "/" {
            return None;
        }
        path.strip_prefix(self.prefix.as_str())
    }
}

/// Replaces the first occurrence of a subpath.
#[derive(Debug, Clone)]
pub struct SubpathRewrite {
    source: String,
    dest: String,
}

impl SubpathRewrite {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }

    /// Applies the rewrite if `remaining` starts with the source subpath.
    ///
    /// The replacement is a first-occurrence substring replace, not an anchored one.
    pub fn apply(&self, remaining: &str) -> Option<String> {
        if !remaining.starts_with(self.source.as_str()) {
            return None;
        }
        Some(remaining.replacen(self.source.as_str(), &self.dest, 1))
    }
}

impl From<&PathRewrite> for SubpathRewrite {
    fn from(rewrite: &PathRewrite) -> Self {
        Self::new(rewrite.source.clone(), rewrite.dest.clone())
    }
}

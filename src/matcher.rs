//! Leaf filtering for kispec.
//!
//! A matcher decides, per leaf, whether the leaf takes part in a run. It is
//! evaluated against the fully qualified name of the leaf, that is the names
//! of all enclosing groups and the leaf itself joined with `/`
//! (`Numbers/Addition/adds two numbers`).
//!
//! A leaf that does not match is treated exactly like an excluded or pending
//! leaf: its body never runs, it never fails the run and it does not cause any
//! hook of its ancestors to fire.

use regex::Regex;

/// A filter over fully qualified leaf names.
///
/// The default matcher has no pattern and matches every leaf.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    pattern: Option<Regex>,
}

impl Matcher {
    /// A matcher that lets every leaf through.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a matcher from a regular expression.
    ///
    /// An empty pattern matches everything.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        if pattern.is_empty() {
            return Ok(Self::all());
        }

        Ok(Self {
            pattern: Some(Regex::new(pattern)?),
        })
    }

    /// The pattern this matcher was built from, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_ref().map(Regex::as_str)
    }

    /// Whether the leaf with the given fully qualified name should run.
    pub fn is_match(&self, full_name: &str) -> bool {
        match &self.pattern {
            None => true,
            Some(pattern) => pattern.is_match(full_name),
        }
    }
}

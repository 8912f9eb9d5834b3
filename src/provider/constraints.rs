//! Tag constraints that scope which applications this provider exposes.
//!
//! Syntax: `tag==<glob>` (some tag must match) or `tag!=<glob>` (no tag may match).

use std::fmt;
use std::str::FromStr;

use globset::{Glob, GlobMatcher};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("constraint '{0}' must look like 'tag==value' or 'tag!=value'")]
    Malformed(String),

    #[error("constraint key '{0}' is not supported, only 'tag' is")]
    UnsupportedKey(String),

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// A single compiled constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Constraint {
    key: String,
    must_match: bool,
    pattern: String,
    matcher: GlobMatcher,
}

impl Constraint {
    pub fn must_match(&self) -> bool {
        self.must_match
    }

    /// True when at least one tag matches the pattern.
    pub fn matches_any(&self, tags: &[String]) -> bool {
        tags.iter().any(|tag| self.matcher.is_match(tag.as_str()))
    }

    /// True when the tag set satisfies this constraint.
    pub fn is_satisfied_by(&self, tags: &[String]) -> bool {
        self.matches_any(tags) == self.must_match
    }
}

impl FromStr for Constraint {
    type Err = ConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, must_match, pattern) = if let Some((key, pattern)) = s.split_once("==") {
            (key, true, pattern)
        } else if let Some((key, pattern)) = s.split_once("!=") {
            (key, false, pattern)
        } else {
            return Err(ConstraintError::Malformed(s.to_string()));
        };

        let key = key.trim();
        if key != "tag" {
            return Err(ConstraintError::UnsupportedKey(key.to_string()));
        }
        let pattern = pattern.trim();
        let matcher = Glob::new(pattern)
            .map_err(|e| ConstraintError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        Ok(Self {
            key: key.to_string(),
            must_match,
            pattern: pattern.to_string(),
            matcher,
        })
    }
}

impl TryFrom<String> for Constraint {
    type Error = ConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Constraint> for String {
    fn from(constraint: Constraint) -> Self {
        constraint.to_string()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = if self.must_match { "==" } else { "!=" };
        write!(f, "{}{}{}", self.key, op, self.pattern)
    }
}

/// Check every constraint; on failure return the first one that rejected the tags.
pub fn match_constraints<'a>(
    constraints: &'a [Constraint],
    tags: &[String],
) -> Result<(), &'a Constraint> {
    match constraints.iter().find(|c| !c.is_satisfied_by(tags)) {
        Some(failing) => Err(failing),
        None => Ok(()),
    }
}

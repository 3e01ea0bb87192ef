//! Line classification and reconstruction.
//!
//! [`classify`] decides what kind of entry a raw requirements line is and
//! whether it is a candidate for pinning. [`pinned_line`] renders a pinned
//! entry from its parsed fields. Lines that are not pinned are always
//! emitted verbatim by the caller, never re-serialized.

use tracing::warn;

use crate::requirement::{Requirement, RequirementParseError};

/// What a raw line turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// Empty or whitespace-only.
    Blank,
    /// Starts with `#` after leading whitespace.
    Comment,
    /// Not a requirement specifier (pip options, trailing comments, typos).
    Unparseable(RequirementParseError),
    /// A `name @ url` direct reference.
    DirectUrl(Requirement),
    /// Already carries a version specifier.
    Constrained(Requirement),
    /// No specifier and no URL: a pinning candidate.
    Unpinned(Requirement),
}

impl LineClass {
    /// Whether a version should be resolved for this line.
    pub fn is_candidate(&self) -> bool {
        matches!(self, Self::Unpinned(_))
    }
}

/// Classify one line with its trailing newline already removed.
pub fn classify(line: &str) -> LineClass {
    let stripped = line.trim();
    if stripped.is_empty() {
        return LineClass::Blank;
    }
    if stripped.starts_with('#') {
        return LineClass::Comment;
    }

    let requirement = match Requirement::parse(line) {
        Ok(requirement) => requirement,
        Err(e) => {
            warn!("Could not parse the line: '{}'. Error: {}", line, e);
            return LineClass::Unparseable(e);
        }
    };

    if requirement.url.is_some() {
        LineClass::DirectUrl(requirement)
    } else if requirement.has_specifier() {
        LineClass::Constrained(requirement)
    } else {
        LineClass::Unpinned(requirement)
    }
}

/// Render `requirement` pinned to exactly `version`.
///
/// Produces `name[extra1,extra2]==version; marker`, with the extras and
/// marker parts present only when the requirement has them.
pub fn pinned_line(requirement: &Requirement, version: &str) -> String {
    let mut line = requirement.name.clone();

    if !requirement.extras.is_empty() {
        let extras: Vec<&str> = requirement.extras.iter().map(String::as_str).collect();
        line.push('[');
        line.push_str(&extras.join(","));
        line.push(']');
    }

    line.push_str("==");
    line.push_str(version);

    if let Some(marker) = &requirement.marker {
        line.push_str("; ");
        line.push_str(&marker.to_string());
    }

    line
}

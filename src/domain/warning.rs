//! Parse warning taxonomy
//!
//! The parser never aborts on a malformed line; it accumulates warnings
//! alongside a best-effort model so a large personal file stays usable
//! even with local mistakes.

use serde::Serialize;
use thiserror::Error;

/// A non-fatal problem found while parsing or resolving an outline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A date-shaped annotation that failed to parse; it is dropped from
    /// the model and left in the display text.
    #[error("line {line}: malformed date '{text}'")]
    MalformedDate { line: usize, text: String },

    /// An `EVERY` clause that failed to parse.
    #[error("line {line}: malformed recurrence spec '{text}'")]
    MalformedRecurrence { line: usize, text: String },

    /// The same tag defined twice; the later definition wins.
    #[error("line {line}: duplicate definition of tag '{tag}' (also defined on line {first_line})")]
    DuplicateTag {
        line: usize,
        tag: String,
        first_line: usize,
    },

    /// An `@after:` reference to a tag no node defines. The referencing
    /// node stays blocked until the tag taxonomy is corrected.
    #[error("line {line}: reference to undefined tag '{tag}'")]
    UnresolvedDependency { line: usize, tag: String },

    /// A reference chain that loops back on itself.
    #[error("dependency cycle through tags: {}", .tags.join(" -> "))]
    CyclicDependency { tags: Vec<String> },

    /// The input produced no outline nodes at all.
    #[error("document contains no sections, projects or actions")]
    EmptyDocument,
}

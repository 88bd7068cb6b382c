//! Completion editing
//!
//! Pure, line-local completion: given the literal text of one source
//! line and the current timestamp, produce a structured edit (byte span
//! plus replacement) the host applies however it manages text. Nothing
//! here needs the rest of the tree.
//!
//! A non-recurring action or project header gets a `(DONE ...)` stamp
//! appended. A recurring line has its `(LASTDONE ...)` datetime
//! replaced in place (or a first stamp appended). Anything else is
//! reported as not completable rather than silently edited.

use std::ops::Range;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::date;

/// Why a line could not be completed. Returned to the caller, never
/// thrown through the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NotCompletable {
    #[error("line already carries a DONE stamp")]
    AlreadyComplete,
    #[error("line is not an action or project header")]
    NotAnAction,
}

/// A single-line text patch: replace `span` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    pub span: Range<usize>,
    pub replacement: String,
}

impl LineEdit {
    pub fn apply(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len() + self.replacement.len());
        out.push_str(&line[..self.span.start]);
        out.push_str(&self.replacement);
        out.push_str(&line[self.span.end..]);
        out
    }
}

/// Computes the completion edit for one line at the given instant.
pub fn complete(line: &str, now: NaiveDateTime) -> Result<LineEdit, NotCompletable> {
    if is_recurring(line) {
        return Ok(advance_lastdone(line, now));
    }
    if find_stamp(line, "(DONE").is_some() {
        return Err(NotCompletable::AlreadyComplete);
    }
    if !is_header(line) {
        return Err(NotCompletable::NotAnAction);
    }
    let end = line.trim_end().len();
    Ok(LineEdit {
        span: end..end,
        replacement: format!(" (DONE {})", date::format_stamp(now)),
    })
}

fn is_recurring(line: &str) -> bool {
    line.split_whitespace().any(|tok| tok == "EVERY")
}

/// `@ `, `# ` or `- ` after the indent.
fn is_header(line: &str) -> bool {
    let body = line.trim_start();
    let mut chars = body.chars();
    matches!(chars.next(), Some('@') | Some('#') | Some('-'))
        && matches!(chars.next(), Some(' ') | Some('\t'))
}

/// Replaces the `(LASTDONE ...)` datetime in place, or appends a first
/// stamp when the line has none.
fn advance_lastdone(line: &str, now: NaiveDateTime) -> LineEdit {
    match find_stamp(line, "(LASTDONE") {
        Some(span) => LineEdit {
            span,
            replacement: date::format_stamp(now),
        },
        None => {
            let end = line.trim_end().len();
            LineEdit {
                span: end..end,
                replacement: format!(" (LASTDONE {})", date::format_stamp(now)),
            }
        }
    }
}

/// Byte span of the valid datetime inside a `(KEYWORD YYYY-MM-DD HH:MM)`
/// stamp, if the line carries one.
fn find_stamp(line: &str, keyword: &str) -> Option<Range<usize>> {
    let mut from = 0;
    while let Some(pos) = line[from..].find(keyword) {
        let start = from + pos;
        let after = start + keyword.len();
        if line[after..].starts_with(' ') {
            let dt_start = after + 1;
            // "YYYY-MM-DD HH:MM" is 16 bytes.
            let dt_end = dt_start + 16;
            if let Some(candidate) = line.get(dt_start..dt_end) {
                if date::parse_datetime(candidate).is_some()
                    && line[dt_end..].trim_start().starts_with(')')
                {
                    return Some(dt_start..dt_end);
                }
            }
        }
        from = after;
    }
    None
}

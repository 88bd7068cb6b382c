//! Line classification
//!
//! Each physical line becomes one tagged record based on its leading
//! non-whitespace symbol: `= Title =` section headers, `# Title` ordered
//! and `- Title` unordered project headers, `@ Text` actions, `* text`
//! project-support material. Anything else non-blank is continuation
//! text belonging to the previous node. Classification never fails; an
//! unrecognized marker combination degrades to continuation text.

/// What a single line of source text is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// `= Title =` with symmetric flanking markers.
    Section { title: String },
    /// `# Title` (ordered) or `- Title` (unordered).
    Project { ordered: bool },
    /// `@ Text`.
    Action,
    /// `* text`: comment-like support material, never a node.
    Support,
    /// Non-blank text with no recognized marker.
    Continuation,
    Blank,
}

/// One classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based position in the source.
    pub number: usize,
    /// Width of the leading whitespace; a tab counts one column.
    pub indent: usize,
    pub kind: LineKind,
    /// Text after the marker for header lines, the trimmed line
    /// otherwise. Annotations are still embedded at this stage.
    pub text: String,
}

pub fn lex(text: &str) -> Vec<Line> {
    text.lines()
        .enumerate()
        .map(|(i, raw)| classify(i + 1, raw))
        .collect()
}

pub fn classify(number: usize, raw: &str) -> Line {
    let indent = raw
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .count();
    // Indent characters are single-byte, so the count doubles as a byte
    // offset into the line.
    let body = raw[indent..].trim_end();

    if body.is_empty() {
        return Line {
            number,
            indent,
            kind: LineKind::Blank,
            text: String::new(),
        };
    }

    if let Some(title) = section_title(body) {
        return Line {
            number,
            indent,
            text: title.clone(),
            kind: LineKind::Section { title },
        };
    }

    let mut chars = body.chars();
    let marker = chars.next();
    let spaced = matches!(chars.next(), Some(' ') | Some('\t'));
    let rest = || body[1..].trim().to_string();

    match (marker, spaced) {
        (Some('#'), true) => Line {
            number,
            indent,
            kind: LineKind::Project { ordered: true },
            text: rest(),
        },
        (Some('-'), true) => Line {
            number,
            indent,
            kind: LineKind::Project { ordered: false },
            text: rest(),
        },
        (Some('@'), true) => Line {
            number,
            indent,
            kind: LineKind::Action,
            text: rest(),
        },
        (Some('*'), true) => Line {
            number,
            indent,
            kind: LineKind::Support,
            text: rest(),
        },
        _ => Line {
            number,
            indent,
            kind: LineKind::Continuation,
            text: body.to_string(),
        },
    }
}

/// `= Title =`: at least one `=` on each side, non-empty title between.
/// Anything after the closing marker (typically annotations) is kept as
/// part of the node's text.
fn section_title(body: &str) -> Option<String> {
    let after_open = body.trim_start_matches('=');
    if after_open.len() == body.len() {
        return None;
    }
    let close = after_open.find('=')?;
    let title = after_open[..close].trim();
    if title.is_empty() {
        return None;
    }
    let trailing = after_open[close..].trim_start_matches('=').trim();
    if trailing.is_empty() {
        Some(title.to_string())
    } else {
        Some(format!("{} {}", title, trailing))
    }
}

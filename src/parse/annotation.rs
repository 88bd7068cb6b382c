//! Annotation extraction
//!
//! Scans a node's accumulated text (header line plus continuation
//! lines) for inline annotations, records them, and strips the consumed
//! spans from the display text. Annotations may appear in any order.
//! Content that merely resembles an annotation but fails to parse is
//! left as literal display text; date-shaped and EVERY-shaped content
//! that fails additionally attaches a warning to the node.

use chrono::NaiveDate;

use crate::domain::date::{self, DueStamp};
use crate::domain::{Annotations, RecurUnit, RecurWindow, RecurrenceSpec, Warning};

/// The result of scanning one node's text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    pub ann: Annotations,
    /// Remaining text with consumed spans removed and whitespace
    /// collapsed.
    pub display: String,
    pub warnings: Vec<Warning>,
}

pub fn extract(text: &str, line: usize) -> Extracted {
    let mut ann = Annotations::default();
    let mut warnings = Vec::new();
    let mut consumed: Vec<(usize, usize)> = Vec::new();

    extract_stamps(text, line, &mut ann, &mut warnings, &mut consumed);
    extract_recurrence(text, line, &mut ann, &mut warnings, &mut consumed);
    extract_sigils(text, line, &mut ann, &mut warnings, &mut consumed);

    Extracted {
        ann,
        display: strip(text, &consumed),
        warnings,
    }
}

/// `(DONE YYYY-MM-DD HH:MM)` and `(LASTDONE YYYY-MM-DD HH:MM)`.
fn extract_stamps(
    text: &str,
    line: usize,
    ann: &mut Annotations,
    warnings: &mut Vec<Warning>,
    consumed: &mut Vec<(usize, usize)>,
) {
    for (keyword, is_done) in [("(DONE", true), ("(LASTDONE", false)] {
        let mut from = 0;
        while let Some(pos) = text[from..].find(keyword) {
            let start = from + pos;
            let after = start + keyword.len();
            if !text[after..].starts_with(' ') {
                from = after;
                continue;
            }
            let close = match text[start..].find(')') {
                Some(rel) => start + rel + 1,
                None => break,
            };
            let inner = text[after..close - 1].trim();
            match date::parse_datetime(inner) {
                Some(stamp) => {
                    if is_done {
                        ann.done = Some(stamp);
                    } else {
                        ann.last_done = Some(stamp);
                    }
                    consumed.push((start, close));
                }
                None => warnings.push(Warning::MalformedDate {
                    line,
                    text: text[start..close].to_string(),
                }),
            }
            from = close;
        }
    }
}

/// `EVERY [N[-M]] <unit>[s] [[window]]`.
fn extract_recurrence(
    text: &str,
    line: usize,
    ann: &mut Annotations,
    warnings: &mut Vec<Warning>,
    consumed: &mut Vec<(usize, usize)>,
) {
    let toks = tokens(text, consumed);
    for (i, &(start, tok)) in toks.iter().enumerate() {
        if tok != "EVERY" {
            continue;
        }
        match parse_recur_clause(&toks[i..], text) {
            Some((spec, end)) => {
                ann.recurrence = Some(spec);
                consumed.push((start, end));
            }
            None => {
                let preview: String = text[start..].chars().take(24).collect();
                warnings.push(Warning::MalformedRecurrence {
                    line,
                    text: preview.trim_end().to_string(),
                });
            }
        }
    }
}

/// Parses a clause beginning at the `EVERY` token; returns the spec and
/// the byte offset one past its last consumed character.
fn parse_recur_clause(toks: &[(usize, &str)], text: &str) -> Option<(RecurrenceSpec, usize)> {
    let mut idx = 1;
    let (min, max) = match toks.get(idx).and_then(|&(_, t)| parse_count(t)) {
        Some(counts) => {
            idx += 1;
            counts
        }
        None => (1, 1),
    };
    if min == 0 || max < min {
        return None;
    }
    let &(unit_start, unit_tok) = toks.get(idx)?;
    let unit = parse_unit(unit_tok)?;
    let mut end = unit_start + unit_tok.len();
    idx += 1;

    let mut window = None;
    if let Some(&(win_start, win_tok)) = toks.get(idx) {
        if win_tok.starts_with('[') {
            let close = text[win_start..].find(']')?;
            let win_end = win_start + close + 1;
            window = Some(parse_window(&text[win_start + 1..win_end - 1])?);
            end = win_end;
        }
    }

    Some((
        RecurrenceSpec {
            min_count: min,
            max_count: max,
            unit,
            window,
        },
        end,
    ))
}

/// `"3"` or `"4-6"`.
fn parse_count(tok: &str) -> Option<(u32, u32)> {
    match tok.split_once('-') {
        Some((min, max)) => {
            let min = min.parse().ok()?;
            let max = max.parse().ok()?;
            Some((min, max))
        }
        None => {
            let n = tok.parse().ok()?;
            Some((n, n))
        }
    }
}

fn parse_unit(tok: &str) -> Option<RecurUnit> {
    let lower = tok.to_ascii_lowercase();
    match lower.strip_suffix('s').unwrap_or(&lower) {
        "day" => Some(RecurUnit::Day),
        "week" => Some(RecurUnit::Week),
        "month" => Some(RecurUnit::Month),
        _ => None,
    }
}

/// `17:00 - 07:00`, `Thu 17:00 - Fri 07:00`, or a single `08:00`
/// (meaning from that time through end of day).
fn parse_window(inner: &str) -> Option<RecurWindow> {
    let parts: Vec<&str> = inner.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [only] => {
            let (day, start) = parse_day_time(only)?;
            let end = date::hm(23, 59);
            match day {
                None => Some(RecurWindow::Time { start, end }),
                Some(d) => Some(RecurWindow::WeekdayTime {
                    start_day: d,
                    start,
                    end_day: d,
                    end,
                }),
            }
        }
        [from, to] => {
            let (start_day, start) = parse_day_time(from)?;
            let (end_day, end) = parse_day_time(to)?;
            match (start_day, end_day) {
                (None, None) => Some(RecurWindow::Time { start, end }),
                (Some(a), Some(b)) => Some(RecurWindow::WeekdayTime {
                    start_day: a,
                    start,
                    end_day: b,
                    end,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn parse_day_time(s: &str) -> Option<(Option<chrono::Weekday>, chrono::NaiveTime)> {
    match s.split_once(char::is_whitespace) {
        Some((day, time)) => Some((Some(parse_weekday(day)?), date::parse_time(time.trim())?)),
        None => Some((None, date::parse_time(s)?)),
    }
}

/// Three-letter weekday prefix, case-insensitive.
fn parse_weekday(s: &str) -> Option<chrono::Weekday> {
    use chrono::Weekday::*;
    match s.get(..3)?.to_ascii_lowercase().as_str() {
        "mon" => Some(Mon),
        "tue" => Some(Tue),
        "wed" => Some(Wed),
        "thu" => Some(Thu),
        "fri" => Some(Fri),
        "sat" => Some(Sat),
        "sun" => Some(Sun),
        _ => None,
    }
}

/// Single-token sigils: `@p:`, `@after:`, `@@ctx`, `@waiting`, `#tag`,
/// `<date` and `>date` (each optionally followed by a time token).
fn extract_sigils(
    text: &str,
    line: usize,
    ann: &mut Annotations,
    warnings: &mut Vec<Warning>,
    consumed: &mut Vec<(usize, usize)>,
) {
    let toks = tokens(text, consumed);
    let mut newly: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    while i < toks.len() {
        let (start, tok) = toks[i];
        let end = start + tok.len();
        let mut step = 1;

        if let Some(rest) = tok.strip_prefix("@p:") {
            if let Ok(priority) = rest.parse::<i32>() {
                ann.priority = Some(priority);
                newly.push((start, end));
            }
        } else if let Some(rest) = tok.strip_prefix("@after:") {
            let name = rest.trim_end_matches([',', '.', ';']);
            if is_word(name) {
                ann.after.push(name.to_string());
                newly.push((start, end));
            }
        } else if let Some(rest) = tok.strip_prefix("@@") {
            if rest.eq_ignore_ascii_case("waiting") {
                ann.waiting = true;
                newly.push((start, end));
            } else if is_word(rest) {
                ann.contexts.insert(rest.to_string());
                newly.push((start, end));
            }
        } else if tok.eq_ignore_ascii_case("@waiting") {
            ann.waiting = true;
            newly.push((start, end));
        } else if let Some(rest) = tok.strip_prefix('#') {
            if is_word(rest) {
                ann.defines.push(rest.to_string());
                newly.push((start, end));
            }
        } else if let Some(rest) = tok.strip_prefix('<') {
            match parse_date_token(rest) {
                DateProbe::Parsed(day, lead_days) => {
                    let (at, with_time) =
                        attach_time(&toks, i, day, date::due_default_time());
                    ann.due = Some(DueStamp { at, lead_days });
                    newly.push((start, end));
                    if with_time {
                        let (tstart, ttok) = toks[i + 1];
                        newly.push((tstart, tstart + ttok.len()));
                        step = 2;
                    }
                }
                DateProbe::Malformed => warnings.push(Warning::MalformedDate {
                    line,
                    text: tok.to_string(),
                }),
                DateProbe::NotADate => {}
            }
        } else if let Some(rest) = tok.strip_prefix('>') {
            match parse_date_token(rest) {
                DateProbe::Parsed(day, _) => {
                    let (at, with_time) =
                        attach_time(&toks, i, day, date::visible_default_time());
                    ann.visible = Some(at);
                    newly.push((start, end));
                    if with_time {
                        let (tstart, ttok) = toks[i + 1];
                        newly.push((tstart, tstart + ttok.len()));
                        step = 2;
                    }
                }
                DateProbe::Malformed => warnings.push(Warning::MalformedDate {
                    line,
                    text: tok.to_string(),
                }),
                DateProbe::NotADate => {}
            }
        }

        i += step;
    }
    consumed.extend(newly);
}

enum DateProbe {
    /// A date, with its optional `(N)` lead-days suffix.
    Parsed(NaiveDate, Option<u32>),
    /// Looked like a date (leading digit) but did not parse.
    Malformed,
    /// Arbitrary text; leave it alone.
    NotADate,
}

fn parse_date_token(rest: &str) -> DateProbe {
    if !rest.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        return DateProbe::NotADate;
    }
    let (day, lead) = match rest.split_once('(') {
        Some((day, lead)) => {
            let lead = match lead.strip_suffix(')').and_then(|n| n.parse().ok()) {
                Some(n) => n,
                None => return DateProbe::Malformed,
            };
            (day, Some(lead))
        }
        None => (rest, None),
    };
    match date::parse_date(day) {
        Some(parsed) => DateProbe::Parsed(parsed, lead),
        None => DateProbe::Malformed,
    }
}

/// Combines a date with the next token when it is an `HH:MM` time,
/// otherwise with the given default time of day.
fn attach_time(
    toks: &[(usize, &str)],
    i: usize,
    day: NaiveDate,
    default: chrono::NaiveTime,
) -> (chrono::NaiveDateTime, bool) {
    if let Some(&(_, next)) = toks.get(i + 1) {
        if next.len() == 5 {
            if let Some(time) = date::parse_time(next) {
                return (day.and_time(time), true);
            }
        }
    }
    (day.and_time(default), false)
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

/// Whitespace-separated tokens with byte offsets, skipping any token
/// overlapping an already-consumed span.
fn tokens<'a>(text: &'a str, consumed: &[(usize, usize)]) -> Vec<(usize, &'a str)> {
    let mut out = Vec::new();
    let mut tok_start: Option<usize> = None;
    for (i, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some(s) = tok_start.take() {
                out.push((s, &text[s..i]));
            }
        } else if tok_start.is_none() {
            tok_start = Some(i);
        }
    }
    if let Some(s) = tok_start {
        out.push((s, &text[s..]));
    }
    out.retain(|&(s, t)| !overlaps(consumed, s, s + t.len()));
    out
}

fn overlaps(spans: &[(usize, usize)], start: usize, end: usize) -> bool {
    spans.iter().any(|&(s, e)| start < e && s < end)
}

/// Rebuilds the text without the consumed spans, collapsing whitespace.
fn strip(text: &str, consumed: &[(usize, usize)]) -> String {
    let mut spans = consumed.to_vec();
    spans.sort_unstable();
    let mut kept = String::with_capacity(text.len());
    let mut pos = 0;
    for (start, end) in spans {
        if start > pos {
            kept.push_str(&text[pos..start]);
        }
        pos = pos.max(end);
    }
    if pos < text.len() {
        kept.push_str(&text[pos..]);
    }
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

//! View generation
//!
//! Pure functions from a resolved model to ordered view lines. Each
//! item carries its display text and a `(file, line)` source reference
//! the host turns into a jump target. Ordering within a view: ascending
//! effective due date (absent sorts last), ties broken by descending
//! effective priority, then by document order.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{date, Model, NodeId, SourceRef};

/// Context marking inbox-style recurring items.
pub const INBOX_CONTEXT: &str = "inbox";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    NextActions,
    Inboxes,
    Recurring,
    Waiting,
    All,
}

/// Context include/exclude sets. The exclude set dominates the include
/// set; an empty include set admits everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextFilter {
    pub include: std::collections::BTreeSet<String>,
    pub exclude: std::collections::BTreeSet<String>,
}

impl ContextFilter {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        Self {
            include: include.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    pub fn admits(&self, contexts: &std::collections::BTreeSet<String>) -> bool {
        if contexts.iter().any(|c| self.exclude.contains(c)) {
            return false;
        }
        self.include.is_empty() || contexts.iter().any(|c| self.include.contains(c))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    Due,
}

/// One line of a rendered view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewItem {
    pub text: String,
    pub source: SourceRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<DueStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDateTime>,
    pub priority: i32,
}

/// Renders one view of the model at the given instant.
pub fn render(model: &Model, kind: ViewKind, filter: &ContextFilter, now: NaiveDateTime) -> Vec<ViewItem> {
    let ids = match kind {
        ViewKind::NextActions => next_action_ids(model, filter, now),
        ViewKind::Inboxes => inbox_ids(model, filter, now),
        ViewKind::Recurring => recurring_ids(model, filter),
        ViewKind::Waiting => waiting_ids(model, filter),
        ViewKind::All => {
            // Union of next actions, inboxes and recurring, de-duplicated
            // by node identity.
            let mut seen = HashSet::new();
            let mut ids = Vec::new();
            for id in next_action_ids(model, filter, now)
                .into_iter()
                .chain(inbox_ids(model, filter, now))
                .chain(recurring_ids(model, filter))
            {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
            ids
        }
    };

    let mut items: Vec<ViewItem> = ids
        .into_iter()
        .map(|id| make_item(model, id, kind, now))
        .collect();
    items.sort_by_key(|item| {
        (
            item.due.is_none(),
            item.due,
            Reverse(item.priority),
            item.source.line,
        )
    });
    items
}

fn next_action_ids(model: &Model, filter: &ContextFilter, now: NaiveDateTime) -> Vec<NodeId> {
    let suppressed = ordered_suppressed(model);
    model
        .preorder()
        .into_iter()
        .filter(|&id| {
            let node = model.node(id);
            let attrs = model.attrs(id);
            node.kind.is_action()
                && !node.ann.is_recurring()
                && !node.ann.is_complete()
                && !node.ann.waiting
                && attrs.blocked.is_none()
                && attrs.visible.map_or(true, |v| v <= now)
                && filter.admits(&attrs.contexts)
                && !suppressed.contains(&id)
        })
        .collect()
}

/// In an ordered project only the first incomplete child qualifies;
/// every other incomplete child's subtree is suppressed regardless of
/// its own blocked state.
fn ordered_suppressed(model: &Model) -> HashSet<NodeId> {
    let mut out = HashSet::new();
    for id in model.preorder() {
        let node = model.node(id);
        if !node.kind.is_ordered_project() {
            continue;
        }
        let mut seen_first = false;
        for &child in &node.children {
            if model.node(child).ann.is_complete() {
                continue;
            }
            if !seen_first {
                seen_first = true;
                continue;
            }
            mark_subtree(model, child, &mut out);
        }
    }
    out
}

fn mark_subtree(model: &Model, id: NodeId, out: &mut HashSet<NodeId>) {
    out.insert(id);
    for &child in &model.node(id).children {
        mark_subtree(model, child, out);
    }
}

fn inbox_ids(model: &Model, filter: &ContextFilter, now: NaiveDateTime) -> Vec<NodeId> {
    model
        .preorder()
        .into_iter()
        .filter(|&id| {
            let node = model.node(id);
            let attrs = model.attrs(id);
            node.kind.is_action()
                && attrs.contexts.contains(INBOX_CONTEXT)
                && filter.admits(&attrs.contexts)
                && node
                    .ann
                    .recurrence
                    .map_or(false, |spec| spec.is_due(node.ann.last_done, now))
        })
        .collect()
}

fn recurring_ids(model: &Model, filter: &ContextFilter) -> Vec<NodeId> {
    model
        .preorder()
        .into_iter()
        .filter(|&id| {
            let node = model.node(id);
            node.kind.is_action()
                && node.ann.is_recurring()
                && filter.admits(&model.attrs(id).contexts)
        })
        .collect()
}

fn waiting_ids(model: &Model, filter: &ContextFilter) -> Vec<NodeId> {
    model
        .preorder()
        .into_iter()
        .filter(|&id| {
            let node = model.node(id);
            node.ann.waiting && filter.admits(&model.attrs(id).contexts)
        })
        .collect()
}

fn make_item(model: &Model, id: NodeId, kind: ViewKind, now: NaiveDateTime) -> ViewItem {
    let node = model.node(id);
    let attrs = model.attrs(id);

    let (status, due) = if node.ann.is_recurring() {
        match attrs.next_due {
            // Never completed: due from the start.
            None => (Some(DueStatus::Due), None),
            Some(window) => {
                let status = if now >= window.latest {
                    Some(DueStatus::Overdue)
                } else if now >= window.earliest {
                    Some(DueStatus::Due)
                } else {
                    None
                };
                (status, Some(window.earliest))
            }
        }
    } else {
        match attrs.due {
            None => (None, None),
            Some(at) => {
                let status = if now >= at {
                    DueStatus::Overdue
                } else {
                    DueStatus::Due
                };
                (Some(status), Some(at))
            }
        }
    };

    let mut text = node.text.clone();
    if kind == ViewKind::Recurring {
        if let Some(spec) = &node.ann.recurrence {
            let next = match attrs.next_due {
                Some(window) => format!("next {}", date::format_stamp(window.earliest)),
                None => "never done".to_string(),
            };
            text = format!("{} ({}, {})", text, spec, next);
        }
    } else {
        match (status, due) {
            (Some(DueStatus::Overdue), Some(at)) => {
                text = format!("{} (Overdue {})", text, date::humanize(at, now));
            }
            (Some(DueStatus::Due), Some(at)) => {
                text = format!("{} (Due {})", text, date::humanize(at, now));
            }
            (Some(DueStatus::Due), None) => {
                text = format!("{} (Due)", text);
            }
            _ => {}
        }
    }

    ViewItem {
        text,
        source: model.source_ref(id),
        status,
        due,
        priority: attrs.priority,
    }
}

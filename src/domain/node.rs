//! Outline tree model
//!
//! A parsed outline is an arena of nodes: sections at the top, projects
//! (ordered or unordered, possibly nested) below them, actions as the
//! leaf unit of work. Annotations extracted from a node's text live on
//! the node; effective attributes are computed later in a separate pass
//! and never mutate the tree.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::date::DueStamp;
use super::recurrence::RecurrenceSpec;

/// Opaque identifier for a source file, assigned by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u32);

/// A jump target the host resolves back into its own editor/viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file: FileId,
    /// 1-based line number of the node's header line.
    pub line: usize,
}

/// Index of a node in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Section,
    Project { ordered: bool },
    Action,
}

impl NodeKind {
    pub fn is_section(&self) -> bool {
        matches!(self, NodeKind::Section)
    }

    pub fn is_project(&self) -> bool {
        matches!(self, NodeKind::Project { .. })
    }

    pub fn is_ordered_project(&self) -> bool {
        matches!(self, NodeKind::Project { ordered: true })
    }

    pub fn is_action(&self) -> bool {
        matches!(self, NodeKind::Action)
    }
}

/// Inline annotations extracted from a node's accumulated text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    /// `@p:<int>`
    pub priority: Option<i32>,
    /// `<YYYY-MM-DD[(N)][ HH:MM]`
    pub due: Option<DueStamp>,
    /// `>YYYY-MM-DD[ HH:MM]`
    pub visible: Option<NaiveDateTime>,
    /// `@@word`
    pub contexts: BTreeSet<String>,
    /// `#tag` definitions exported by this node, in document order.
    pub defines: Vec<String>,
    /// `@after:tag` references, in document order. AND semantics: every
    /// referenced tag's definer must be complete before this node runs.
    pub after: Vec<String>,
    /// `@@waiting` / `@waiting`: blocked on an external party.
    pub waiting: bool,
    /// `EVERY <spec>`
    pub recurrence: Option<RecurrenceSpec>,
    /// `(DONE YYYY-MM-DD HH:MM)`
    pub done: Option<NaiveDateTime>,
    /// `(LASTDONE YYYY-MM-DD HH:MM)`
    pub last_done: Option<NaiveDateTime>,
}

impl Annotations {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// A recurring node never reaches a terminal done state; completing
    /// it only advances its last-done stamp.
    pub fn is_complete(&self) -> bool {
        self.done.is_some() && !self.is_recurring()
    }
}

/// One outline node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    /// Display text with all annotations stripped.
    pub text: String,
    /// 1-based line number of the header line in the source.
    pub line: usize,
    pub ann: Annotations,
    pub children: Vec<NodeId>,
}

/// The parsed outline tree, before attribute resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
}

impl Document {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a node, wiring it into its parent's child list (or the
    /// document roots). Returns the new node's id.
    pub fn push(
        &mut self,
        parent: Option<NodeId>,
        kind: NodeKind,
        text: String,
        line: usize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            parent,
            kind,
            text,
            line,
            ann: Annotations::default(),
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Attaches a continuation line's text to an existing node.
    pub fn append_text(&mut self, id: NodeId, text: &str) {
        let node = &mut self.nodes[id.0];
        node.text.push('\n');
        node.text.push_str(text);
    }

    /// Node ids in document order, parents before children.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            for &child in self.node(id).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }
}

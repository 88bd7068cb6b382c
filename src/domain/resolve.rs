//! Attribute resolution
//!
//! A single pre-order pass computes every node's effective priority, due
//! date, visible date and context set from its own annotations and its
//! parent's already-resolved values. Priority is overridden, due dates
//! aggregate by minimum, visible dates by maximum, contexts by union.
//! Two follow-up passes mark dependency-blocked nodes and projects with
//! nothing actionable beneath them. Attributes are immutable once
//! computed; the whole model is rebuilt from scratch per parse.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::graph::TagGraph;
use super::node::{Document, FileId, Node, NodeId, NodeKind, SourceRef};
use super::recurrence::DueWindow;
use super::warning::Warning;

/// Why a node is not currently actionable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum BlockReason {
    /// Referenced tags whose defining nodes are not yet complete.
    WaitingOnTags { tags: Vec<String> },
    /// Referenced tags with no definition anywhere in the document.
    UnresolvedTags { tags: Vec<String> },
    /// A project with no incomplete, unblocked action beneath it.
    NoNextAction,
}

/// Effective attributes computed for one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAttrs {
    pub priority: i32,
    pub due: Option<NaiveDateTime>,
    /// Lead time of the node's own due stamp, if it carries one.
    pub due_lead_days: Option<u32>,
    pub visible: Option<NaiveDateTime>,
    pub contexts: BTreeSet<String>,
    pub blocked: Option<BlockReason>,
    /// Next-due window for recurring nodes with a last-done stamp.
    pub next_due: Option<DueWindow>,
}

/// A fully parsed and resolved outline.
#[derive(Debug, Clone)]
pub struct Model {
    doc: Document,
    attrs: Vec<ResolvedAttrs>,
    warnings: Vec<Warning>,
    file: FileId,
}

impl Model {
    /// Resolves a parsed document into an immutable model. `warnings`
    /// carries whatever the parse already accumulated; tag-resolution
    /// warnings are appended.
    pub fn resolve(doc: Document, mut warnings: Vec<Warning>, file: FileId) -> Self {
        let tags = TagGraph::build(&doc);
        let order = doc.preorder();
        let mut attrs: Vec<ResolvedAttrs> =
            doc.nodes.iter().map(|_| ResolvedAttrs::default()).collect();

        // Inherited attributes, parents first.
        for &id in &order {
            let node = doc.node(id);
            let (p_prio, p_due, p_vis, p_ctx) = match node.parent {
                Some(p) => {
                    let a = &attrs[p.0];
                    (a.priority, a.due, a.visible, a.contexts.clone())
                }
                None => (0, None, None, BTreeSet::new()),
            };
            let a = &mut attrs[id.0];
            a.priority = node.ann.priority.unwrap_or(p_prio);
            a.due = min_date(node.ann.due.map(|d| d.at), p_due);
            a.due_lead_days = node.ann.due.and_then(|d| d.lead_days);
            a.visible = max_date(node.ann.visible, p_vis);
            a.contexts = p_ctx;
            a.contexts.extend(node.ann.contexts.iter().cloned());
            if let Some(spec) = node.ann.recurrence {
                a.next_due = spec.next_due(node.ann.last_done);
            }
        }

        // Dependency blocking from the node's own direct references.
        // Chains of @after: still behave transitively because definer
        // completion is re-read from the live tree on each reparse.
        for &id in &order {
            let node = doc.node(id);
            if node.ann.is_complete() {
                continue;
            }
            let refs = tags.references(id);
            if refs.is_empty() {
                continue;
            }
            let unresolved: Vec<String> = refs
                .iter()
                .filter(|(_, target)| target.is_none())
                .map(|(tag, _)| tag.clone())
                .collect();
            if !unresolved.is_empty() {
                attrs[id.0].blocked = Some(BlockReason::UnresolvedTags { tags: unresolved });
                continue;
            }
            let pending: Vec<String> = refs
                .iter()
                .filter(|(_, target)| {
                    target.map_or(false, |definer| !doc.node(definer).ann.is_complete())
                })
                .map(|(tag, _)| tag.clone())
                .collect();
            if !pending.is_empty() {
                attrs[id.0].blocked = Some(BlockReason::WaitingOnTags { tags: pending });
            }
        }

        // Projects with nothing actionable beneath them. A waiting
        // project is exempt: it is blocked on an external party, not on
        // missing planning.
        for &id in &order {
            let node = doc.node(id);
            if !node.kind.is_project() || node.ann.is_complete() || node.ann.waiting {
                continue;
            }
            if attrs[id.0].blocked.is_some() {
                continue;
            }
            if !has_next_action(&doc, &attrs, id) {
                attrs[id.0].blocked = Some(BlockReason::NoNextAction);
            }
        }

        warnings.extend(tags.into_warnings());
        Model {
            doc,
            attrs,
            warnings,
            file,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.doc.node(id)
    }

    pub fn attrs(&self, id: NodeId) -> &ResolvedAttrs {
        &self.attrs[id.0]
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn preorder(&self) -> Vec<NodeId> {
        self.doc.preorder()
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn file(&self) -> FileId {
        self.file
    }

    pub fn source_ref(&self, id: NodeId) -> SourceRef {
        SourceRef {
            file: self.file,
            line: self.node(id).line,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }
}

fn min_date(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_date(a: Option<NaiveDateTime>, b: Option<NaiveDateTime>) -> Option<NaiveDateTime> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Whether a project has at least one actionable next step. For an
/// ordered project only the first incomplete child counts; for an
/// unordered project any child may qualify. Recurring actions count:
/// a tickler project full of recurring items is not missing anything.
fn has_next_action(doc: &Document, attrs: &[ResolvedAttrs], project: NodeId) -> bool {
    let node = doc.node(project);
    let mut incomplete = node
        .children
        .iter()
        .copied()
        .filter(|&c| !doc.node(c).ann.is_complete());
    if node.kind.is_ordered_project() {
        match incomplete.next() {
            Some(first) => eligible(doc, attrs, first),
            None => false,
        }
    } else {
        incomplete.any(|c| eligible(doc, attrs, c))
    }
}

fn eligible(doc: &Document, attrs: &[ResolvedAttrs], id: NodeId) -> bool {
    let node = doc.node(id);
    match node.kind {
        NodeKind::Action => attrs[id.0].blocked.is_none() && !node.ann.waiting,
        NodeKind::Project { .. } => {
            !node.ann.waiting && attrs[id.0].blocked.is_none() && has_next_action(doc, attrs, id)
        }
        NodeKind::Section => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::date::{parse_datetime, DueStamp};
    use crate::domain::node::Annotations;
    use crate::domain::recurrence::{RecurUnit, RecurrenceSpec};

    fn dt(s: &str) -> NaiveDateTime {
        parse_datetime(s).unwrap()
    }

    struct Builder {
        doc: Document,
    }

    impl Builder {
        fn new() -> Self {
            Self {
                doc: Document::default(),
            }
        }

        fn add(&mut self, parent: Option<NodeId>, kind: NodeKind, ann: Annotations) -> NodeId {
            let line = self.doc.len() + 1;
            let id = self.doc.push(parent, kind, format!("node {}", line), line);
            self.doc.node_mut(id).ann = ann;
            id
        }

        fn resolve(self) -> Model {
            Model::resolve(self.doc, Vec::new(), FileId(0))
        }
    }

    fn ann() -> Annotations {
        Annotations::default()
    }

    fn with_priority(p: i32) -> Annotations {
        Annotations {
            priority: Some(p),
            ..ann()
        }
    }

    fn with_due(s: &str) -> Annotations {
        Annotations {
            due: Some(DueStamp {
                at: dt(s),
                lead_days: None,
            }),
            ..ann()
        }
    }

    fn with_visible(s: &str) -> Annotations {
        Annotations {
            visible: Some(dt(s)),
            ..ann()
        }
    }

    #[test]
    fn priority_overrides_down_the_tree() {
        let mut b = Builder::new();
        let section = b.add(None, NodeKind::Section, with_priority(4));
        let plain = b.add(Some(section), NodeKind::Action, ann());
        let project = b.add(
            Some(section),
            NodeKind::Project { ordered: false },
            with_priority(2),
        );
        let inherited = b.add(Some(project), NodeKind::Action, ann());
        let overridden = b.add(Some(project), NodeKind::Action, with_priority(0));
        let model = b.resolve();

        assert_eq!(model.attrs(plain).priority, 4);
        assert_eq!(model.attrs(project).priority, 2);
        assert_eq!(model.attrs(inherited).priority, 2);
        assert_eq!(model.attrs(overridden).priority, 0);
    }

    #[test]
    fn due_dates_aggregate_by_minimum() {
        let mut b = Builder::new();
        let project = b.add(
            None,
            NodeKind::Project { ordered: false },
            with_due("2013-08-25 23:59"),
        );
        let a = b.add(Some(project), NodeKind::Action, ann());
        let earlier = b.add(Some(project), NodeKind::Action, with_due("2013-08-23 23:59"));
        let later = b.add(Some(project), NodeKind::Action, with_due("2013-08-27 23:59"));
        let model = b.resolve();

        assert_eq!(model.attrs(a).due, Some(dt("2013-08-25 23:59")));
        assert_eq!(model.attrs(earlier).due, Some(dt("2013-08-23 23:59")));
        // min wins despite the later literal annotation
        assert_eq!(model.attrs(later).due, Some(dt("2013-08-25 23:59")));
    }

    #[test]
    fn visible_dates_aggregate_by_maximum() {
        let mut b = Builder::new();
        let project = b.add(
            None,
            NodeKind::Project { ordered: false },
            with_visible("2013-08-25 00:01"),
        );
        let later = b.add(
            Some(project),
            NodeKind::Action,
            with_visible("2013-08-27 00:01"),
        );
        let earlier = b.add(
            Some(project),
            NodeKind::Action,
            with_visible("2013-08-21 00:01"),
        );
        let model = b.resolve();

        assert_eq!(model.attrs(later).visible, Some(dt("2013-08-27 00:01")));
        assert_eq!(model.attrs(earlier).visible, Some(dt("2013-08-25 00:01")));
    }

    #[test]
    fn contexts_union_with_ancestors() {
        let mut b = Builder::new();
        let project = b.add(
            None,
            NodeKind::Project { ordered: false },
            Annotations {
                contexts: ["home".to_string()].into(),
                ..ann()
            },
        );
        let action = b.add(
            Some(project),
            NodeKind::Action,
            Annotations {
                contexts: ["phone".to_string()].into(),
                ..ann()
            },
        );
        let model = b.resolve();

        let contexts = &model.attrs(action).contexts;
        assert!(contexts.contains("home"));
        assert!(contexts.contains("phone"));
    }

    #[test]
    fn reference_blocks_until_definer_completes() {
        let mut b = Builder::new();
        let blocked = b.add(
            None,
            NodeKind::Action,
            Annotations {
                after: vec!["first".to_string()],
                ..ann()
            },
        );
        // Definition appears after the reference.
        let definer = b.add(
            None,
            NodeKind::Action,
            Annotations {
                defines: vec!["first".to_string()],
                ..ann()
            },
        );
        let model = b.resolve();

        assert!(matches!(
            model.attrs(blocked).blocked,
            Some(BlockReason::WaitingOnTags { .. })
        ));
        assert!(model.attrs(definer).blocked.is_none());
    }

    #[test]
    fn completed_definer_unblocks() {
        let mut b = Builder::new();
        let freed = b.add(
            None,
            NodeKind::Action,
            Annotations {
                after: vec!["first".to_string()],
                ..ann()
            },
        );
        b.add(
            None,
            NodeKind::Action,
            Annotations {
                defines: vec!["first".to_string()],
                done: Some(dt("2013-08-16 21:00")),
                ..ann()
            },
        );
        let model = b.resolve();

        assert!(model.attrs(freed).blocked.is_none());
    }

    #[test]
    fn unresolved_reference_blocks_permanently() {
        let mut b = Builder::new();
        let stuck = b.add(
            None,
            NodeKind::Action,
            Annotations {
                after: vec!["ghost".to_string()],
                ..ann()
            },
        );
        let model = b.resolve();

        assert!(matches!(
            model.attrs(stuck).blocked,
            Some(BlockReason::UnresolvedTags { .. })
        ));
        assert!(model
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::UnresolvedDependency { .. })));
    }

    #[test]
    fn project_without_next_action_is_flagged() {
        let mut b = Builder::new();
        let empty = b.add(None, NodeKind::Project { ordered: true }, ann());
        let model = b.resolve();

        assert_eq!(model.attrs(empty).blocked, Some(BlockReason::NoNextAction));
    }

    #[test]
    fn waiting_project_is_not_flagged() {
        let mut b = Builder::new();
        let waiting = b.add(
            None,
            NodeKind::Project { ordered: true },
            Annotations {
                waiting: true,
                ..ann()
            },
        );
        let model = b.resolve();

        assert!(model.attrs(waiting).blocked.is_none());
    }

    #[test]
    fn ordered_project_blocked_first_child_means_no_next_action() {
        let mut b = Builder::new();
        let project = b.add(None, NodeKind::Project { ordered: true }, ann());
        b.add(
            Some(project),
            NodeKind::Action,
            Annotations {
                after: vec!["ghost".to_string()],
                ..ann()
            },
        );
        b.add(Some(project), NodeKind::Action, ann());
        let model = b.resolve();

        // The first incomplete child is blocked, and ordered projects
        // only ever consider their first incomplete child.
        assert_eq!(model.attrs(project).blocked, Some(BlockReason::NoNextAction));
    }

    #[test]
    fn ordered_project_skips_completed_children() {
        let mut b = Builder::new();
        let project = b.add(None, NodeKind::Project { ordered: true }, ann());
        b.add(
            Some(project),
            NodeKind::Action,
            Annotations {
                done: Some(dt("2013-08-16 21:00")),
                ..ann()
            },
        );
        b.add(Some(project), NodeKind::Action, ann());
        let model = b.resolve();

        assert!(model.attrs(project).blocked.is_none());
    }

    #[test]
    fn recurring_child_counts_as_next_action() {
        let mut b = Builder::new();
        let project = b.add(None, NodeKind::Project { ordered: false }, ann());
        b.add(
            Some(project),
            NodeKind::Action,
            Annotations {
                recurrence: Some(RecurrenceSpec::fixed(1, RecurUnit::Week)),
                ..ann()
            },
        );
        let model = b.resolve();

        assert!(model.attrs(project).blocked.is_none());
    }

    #[test]
    fn recurring_node_gets_next_due_window() {
        let mut b = Builder::new();
        let recur = b.add(
            None,
            NodeKind::Action,
            Annotations {
                recurrence: Some(RecurrenceSpec::range(4, 6, RecurUnit::Week)),
                last_done: Some(dt("2013-08-16 21:00")),
                ..ann()
            },
        );
        let model = b.resolve();

        let window = model.attrs(recur).next_due.unwrap();
        assert_eq!(window.earliest, dt("2013-09-13 21:00"));
        assert_eq!(window.latest, dt("2013-09-27 21:00"));
    }
}

//! Tag dependency resolution
//!
//! `#tag` definitions are collected into a name-to-node map, then every
//! `@after:tag` reference is resolved against it, regardless of where in
//! the document the definition appears. Cycles in the reference chain
//! are reported via petgraph rather than looped over.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

use super::node::{Document, NodeId};
use super::warning::Warning;

/// Resolved tag definitions and references for one document.
#[derive(Debug, Default)]
pub struct TagGraph {
    definitions: HashMap<String, NodeId>,
    /// Per referencing node: `(tag, definer)` pairs; an unresolved
    /// reference has no definer.
    references: HashMap<NodeId, Vec<(String, Option<NodeId>)>>,
    warnings: Vec<Warning>,
}

impl TagGraph {
    pub fn build(doc: &Document) -> Self {
        let mut definitions: HashMap<String, NodeId> = HashMap::new();
        let mut warnings = Vec::new();

        // Pass 1: collect definitions. The later definition wins and the
        // clash is reported.
        for id in doc.preorder() {
            let node = doc.node(id);
            for tag in &node.ann.defines {
                if let Some(prev) = definitions.insert(tag.clone(), id) {
                    warnings.push(Warning::DuplicateTag {
                        line: node.line,
                        tag: tag.clone(),
                        first_line: doc.node(prev).line,
                    });
                }
            }
        }

        // Pass 2: resolve references. Forward references are fine; the
        // map already holds every definition in the document.
        let mut references: HashMap<NodeId, Vec<(String, Option<NodeId>)>> = HashMap::new();
        for id in doc.preorder() {
            let node = doc.node(id);
            if node.ann.after.is_empty() {
                continue;
            }
            let mut refs = Vec::with_capacity(node.ann.after.len());
            for tag in &node.ann.after {
                let target = definitions.get(tag).copied();
                if target.is_none() {
                    warnings.push(Warning::UnresolvedDependency {
                        line: node.line,
                        tag: tag.clone(),
                    });
                }
                refs.push((tag.clone(), target));
            }
            references.insert(id, refs);
        }

        let mut graph = Self {
            definitions,
            references,
            warnings,
        };
        graph.detect_cycles(doc);
        graph
    }

    /// Reports each strongly-connected reference cycle once, naming the
    /// tags its members define in document order.
    fn detect_cycles(&mut self, doc: &Document) {
        let mut graph: DiGraph<NodeId, ()> = DiGraph::new();
        let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();

        for (&referrer, refs) in &self.references {
            for (_, target) in refs {
                let target = match target {
                    Some(t) => *t,
                    None => continue,
                };
                let a = *index
                    .entry(referrer)
                    .or_insert_with(|| graph.add_node(referrer));
                let b = *index.entry(target).or_insert_with(|| graph.add_node(target));
                graph.add_edge(a, b, ());
            }
        }

        for scc in tarjan_scc(&graph) {
            let cyclic = scc.len() > 1
                || scc
                    .first()
                    .map_or(false, |&n| graph.find_edge(n, n).is_some());
            if !cyclic {
                continue;
            }
            let mut members: Vec<NodeId> = scc.iter().map(|&n| graph[n]).collect();
            members.sort();
            let mut tags = Vec::new();
            for id in members {
                for tag in &doc.node(id).ann.defines {
                    if self.definitions.get(tag) == Some(&id) {
                        tags.push(tag.clone());
                    }
                }
            }
            self.warnings.push(Warning::CyclicDependency { tags });
        }
    }

    /// The node defining `tag`, if any.
    pub fn definer(&self, tag: &str) -> Option<NodeId> {
        self.definitions.get(tag).copied()
    }

    /// The `(tag, definer)` pairs a node waits on.
    pub fn references(&self, id: NodeId) -> &[(String, Option<NodeId>)] {
        self.references.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::NodeKind;

    fn doc_with(entries: &[(&[&str], &[&str])]) -> (Document, Vec<NodeId>) {
        // Each entry: (tags defined, tags referenced), one action per entry.
        let mut doc = Document::default();
        let mut ids = Vec::new();
        for (i, (defines, after)) in entries.iter().enumerate() {
            let id = doc.push(None, NodeKind::Action, format!("a{}", i), i + 1);
            doc.node_mut(id).ann.defines = defines.iter().map(|s| s.to_string()).collect();
            doc.node_mut(id).ann.after = after.iter().map(|s| s.to_string()).collect();
            ids.push(id);
        }
        (doc, ids)
    }

    #[test]
    fn forward_references_resolve() {
        let (doc, ids) = doc_with(&[(&[], &["firstAction"]), (&["firstAction"], &[])]);
        let graph = TagGraph::build(&doc);

        assert_eq!(graph.definer("firstAction"), Some(ids[1]));
        assert_eq!(
            graph.references(ids[0]),
            &[("firstAction".to_string(), Some(ids[1]))]
        );
        assert!(graph.warnings().is_empty());
    }

    #[test]
    fn undefined_tag_is_reported() {
        let (doc, ids) = doc_with(&[(&[], &["ghost"])]);
        let graph = TagGraph::build(&doc);

        assert_eq!(graph.references(ids[0]), &[("ghost".to_string(), None)]);
        assert!(matches!(
            graph.warnings(),
            [Warning::UnresolvedDependency { tag, .. }] if tag == "ghost"
        ));
    }

    #[test]
    fn duplicate_definition_later_wins() {
        let (doc, ids) = doc_with(&[(&["t"], &[]), (&["t"], &[])]);
        let graph = TagGraph::build(&doc);

        assert_eq!(graph.definer("t"), Some(ids[1]));
        assert!(matches!(
            graph.warnings(),
            [Warning::DuplicateTag { tag, line: 2, first_line: 1 }] if tag == "t"
        ));
    }

    #[test]
    fn two_node_cycle_is_reported_once() {
        let (doc, _) = doc_with(&[(&["a"], &["b"]), (&["b"], &["a"])]);
        let graph = TagGraph::build(&doc);

        let cycles: Vec<_> = graph
            .warnings()
            .iter()
            .filter(|w| matches!(w, Warning::CyclicDependency { .. }))
            .collect();
        assert_eq!(cycles.len(), 1);
        assert!(matches!(
            cycles[0],
            Warning::CyclicDependency { tags } if tags == &["a".to_string(), "b".to_string()]
        ));
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let (doc, _) = doc_with(&[(&["me"], &["me"])]);
        let graph = TagGraph::build(&doc);

        assert!(graph
            .warnings()
            .iter()
            .any(|w| matches!(w, Warning::CyclicDependency { .. })));
    }

    #[test]
    fn acyclic_chain_has_no_cycle_warning() {
        let (doc, _) = doc_with(&[(&["a"], &[]), (&["b"], &["a"]), (&[], &["b"])]);
        let graph = TagGraph::build(&doc);

        assert!(graph.warnings().is_empty());
    }
}

//! Outline assembly
//!
//! Builds the document tree from classified lines with a stack of open
//! nodes. Marker type decides what a node *is*; indentation decides
//! where it *nests*: a header attaches to the most recent open node
//! whose level is strictly smaller. Section headers always attach to
//! the document root and reset the stack. Blank and support lines leave
//! the open scopes untouched.

use crate::domain::{Document, NodeId, NodeKind};

use super::lexer::{Line, LineKind};

pub fn build(lines: &[Line]) -> Document {
    let mut doc = Document::default();
    // (node, level); sections sit at level 0, headers at indent + 1 so
    // an unindented project still nests under the current section.
    let mut stack: Vec<(NodeId, usize)> = Vec::new();

    for line in lines {
        match &line.kind {
            LineKind::Blank | LineKind::Support => {}
            LineKind::Section { title } => {
                stack.clear();
                let id = doc.push(None, NodeKind::Section, title.clone(), line.number);
                stack.push((id, 0));
            }
            LineKind::Project { ordered } => {
                push_header(
                    &mut doc,
                    &mut stack,
                    line,
                    NodeKind::Project { ordered: *ordered },
                );
            }
            LineKind::Action => {
                push_header(&mut doc, &mut stack, line, NodeKind::Action);
            }
            LineKind::Continuation => match stack.last() {
                Some(&(open, _)) => doc.append_text(open, &line.text),
                // Free text before any node: document-level prose,
                // ignored for modeling purposes.
                None => {}
            },
        }
    }

    doc
}

fn push_header(doc: &mut Document, stack: &mut Vec<(NodeId, usize)>, line: &Line, kind: NodeKind) {
    let level = line.indent + 1;
    while stack.last().map_or(false, |&(_, l)| l >= level) {
        stack.pop();
    }
    let parent = stack.last().map(|&(id, _)| id);
    let id = doc.push(parent, kind, line.text.clone(), line.number);
    stack.push((id, level));
}

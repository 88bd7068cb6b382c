//! Trellis - a plain-text trusted-system outline engine
//!
//! Trellis turns a sigil-annotated text outline into a resolved task
//! model: inherited priorities and dates, tag-based dependency
//! blocking, recurrence scheduling, filtered views, and line-level
//! completion edits. The engine is pure; the `cli` and `storage`
//! modules are the thin host around it.

pub mod cli;
pub mod domain;
pub mod edit;
pub mod parse;
pub mod storage;
pub mod view;

pub use domain::{FileId, Model, Node, NodeId, NodeKind, SourceRef, Warning};
pub use edit::{complete, LineEdit, NotCompletable};
pub use parse::parse;
pub use view::{render, ContextFilter, ViewItem, ViewKind};

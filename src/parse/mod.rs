//! Parsing pipeline
//!
//! Raw text flows through the lexer, the outline builder and the
//! annotation extractor, then attribute resolution turns the tree into
//! an immutable [`Model`]. The pipeline never aborts on malformed
//! input: problems accumulate as warnings on the model and the rest of
//! the document still parses. Each call rebuilds the model from
//! scratch; [`cache::ModelCache`] exists for hosts that want to reuse
//! results across unchanged text.

pub mod annotation;
pub mod cache;
pub mod lexer;
pub mod outline;

use crate::domain::{FileId, Model, Warning};

/// Parses an outline into a resolved model.
pub fn parse(text: &str, file: FileId) -> Model {
    let lines = lexer::lex(text);
    let mut doc = outline::build(&lines);

    let mut warnings = Vec::new();
    if doc.is_empty() {
        warnings.push(Warning::EmptyDocument);
    }

    for node in &mut doc.nodes {
        let extracted = annotation::extract(&node.text, node.line);
        node.ann = extracted.ann;
        node.text = extracted.display;
        warnings.extend(extracted.warnings);
    }

    Model::resolve(doc, warnings, file)
}

//! `trellis view`: render a filtered view of the outline

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;

use crate::domain::FileId;
use crate::parse;
use crate::storage::{source, Config};
use crate::view::{self, ContextFilter, ViewKind};

use super::output::Output;

pub fn run(
    output: &Output,
    config: &Config,
    path: &Path,
    kind: ViewKind,
    include: Vec<String>,
    exclude: Vec<String>,
    now: NaiveDateTime,
) -> Result<()> {
    let text = source::read(path)?;
    let model = parse::parse(&text, FileId(0));
    output.verbose(&format!(
        "parsed {} nodes, {} warnings",
        model.preorder().len(),
        model.warnings().len()
    ));

    // CLI contexts override the configured include list; exclusions
    // accumulate from both sources.
    let include = if include.is_empty() {
        config.contexts.include.clone()
    } else {
        include
    };
    let exclude = exclude
        .into_iter()
        .chain(config.contexts.exclude.iter().cloned());
    let filter = ContextFilter::new(include, exclude);

    let items = view::render(&model, kind, &filter, now);
    if output.is_json() {
        output.data(&items);
    } else {
        for item in &items {
            output.row(&[format!("{:>4}", item.source.line).as_str(), &item.text]);
        }
    }
    Ok(())
}

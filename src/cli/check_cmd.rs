//! `trellis check`: parse the outline and report warnings

use std::path::Path;

use anyhow::Result;

use crate::domain::FileId;
use crate::parse;
use crate::storage::source;

use super::output::Output;

pub fn run(output: &Output, path: &Path) -> Result<()> {
    let text = source::read(path)?;
    let model = parse::parse(&text, FileId(0));

    if output.is_json() {
        output.data(&model.warnings());
        return Ok(());
    }
    if model.warnings().is_empty() {
        output.success("No warnings");
    } else {
        for warning in model.warnings() {
            output.row(&["warning:", &warning.to_string()]);
        }
    }
    Ok(())
}

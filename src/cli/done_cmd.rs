//! `trellis done`: mark the item on a source line as done

use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::NaiveDateTime;

use crate::edit;
use crate::storage::source;

use super::output::Output;

pub fn run(output: &Output, path: &Path, line_number: usize, now: NaiveDateTime) -> Result<()> {
    let new_line = source::update_line(path, line_number, |line| {
        let patch = edit::complete(line, now)
            .map_err(|reason| anyhow!("line {}: {}", line_number, reason))?;
        Ok(patch.apply(line))
    })?;
    output.success(&format!("Updated line {}: {}", line_number, new_line.trim()));
    Ok(())
}

//! Outline file I/O
//!
//! The engine itself never touches files; this module is the CLI host's
//! plain-text access to the outline. Completion uses an exclusive lock
//! around a read-modify-write with an atomic temp-file rename, so a
//! crashed write never leaves a half-edited outline behind.

use std::fs::{self, OpenOptions};
use std::path::Path;

use anyhow::{bail, Context, Result};
use fs2::FileExt;

pub fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read outline: {}", path.display()))
}

/// Applies `edit` to one 1-based line and writes the file back.
/// Returns the new line text.
pub fn update_line<F>(path: &Path, line_number: usize, edit: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String>,
{
    if line_number == 0 {
        bail!("line numbers are 1-based");
    }

    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("Failed to open outline: {}", path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("Failed to lock outline: {}", path.display()))?;

    let result = locked_update(path, line_number, edit);
    let _ = FileExt::unlock(&file);
    result
}

fn locked_update<F>(path: &Path, line_number: usize, edit: F) -> Result<String>
where
    F: FnOnce(&str) -> Result<String>,
{
    let text = read(path)?;
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    // A trailing newline leaves an empty artifact at the end of the split.
    let line_count = if text.ends_with('\n') {
        lines.len() - 1
    } else {
        lines.len()
    };
    let idx = line_number - 1;
    if idx >= line_count {
        bail!(
            "line {} is out of range ({} has {} lines)",
            line_number,
            path.display(),
            line_count
        );
    }

    let original = lines[idx].clone();
    let (body, carriage) = match original.strip_suffix('\r') {
        Some(body) => (body, "\r"),
        None => (original.as_str(), ""),
    };
    let new_line = format!("{}{}", edit(body)?, carriage);
    lines[idx] = new_line.clone();

    let tmp = path.with_extension("trellis.tmp");
    fs::write(&tmp, lines.join("\n"))
        .with_context(|| format!("Failed to write temp file: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace outline: {}", path.display()))?;

    Ok(new_line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn outline(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("todo.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn updates_a_single_line_in_place() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "= S =\n@ task one\n@ task two\n");

        let new_line = update_line(&path, 2, |line| Ok(format!("{} (edited)", line))).unwrap();
        assert_eq!(new_line, "@ task one (edited)");
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "= S =\n@ task one (edited)\n@ task two\n"
        );
    }

    #[test]
    fn preserves_missing_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "@ only line");

        update_line(&path, 1, |line| Ok(format!("{}!", line))).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "@ only line!");
    }

    #[test]
    fn out_of_range_line_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "@ one\n@ two\n");

        assert!(update_line(&path, 3, |line| Ok(line.to_string())).is_err());
        assert!(update_line(&path, 0, |line| Ok(line.to_string())).is_err());
    }

    #[test]
    fn edit_errors_leave_the_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "@ one\n@ two\n");

        let result = update_line(&path, 1, |_| bail!("nope"));
        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "@ one\n@ two\n");
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "@ one\n");

        update_line(&path, 1, |line| Ok(line.to_string())).unwrap();
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn preserves_carriage_returns() {
        let dir = TempDir::new().unwrap();
        let path = outline(&dir, "@ one\r\n@ two\r\n");

        let new_line = update_line(&path, 1, |line| {
            assert!(!line.ends_with('\r'));
            Ok(format!("{}!", line))
        })
        .unwrap();
        assert_eq!(new_line, "@ one!\r");
        assert_eq!(fs::read_to_string(&path).unwrap(), "@ one!\r\n@ two\r\n");
    }
}

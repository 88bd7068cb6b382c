//! Configuration handling
//!
//! Configuration lives in `~/.config/trellis/config.toml`: the default
//! outline file and the standing context include/exclude lists (the
//! plain-text analogue of a contexts file, with exclusion expressed in
//! its own list instead of a `-` prefix). CLI flags override whatever
//! is configured here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Standing context lists applied when a command gives none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Contexts to include by default; empty means everything.
    pub include: Vec<String>,

    /// Contexts to exclude by default. Exclusion always dominates.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Outline file read when `--file` is not given.
    pub outline: Option<PathBuf>,

    /// Standing context filter.
    pub contexts: ContextConfig,
}

impl Config {
    /// Returns the user config file path, when a home directory exists.
    pub fn path() -> Option<PathBuf> {
        ProjectDirs::from("dev", "trellis", "trellis")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the user configuration, falling back to defaults when no
    /// config file exists.
    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "outline = \"/home/me/todo.txt\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.outline, Some(PathBuf::from("/home/me/todo.txt")));
        assert!(config.contexts.include.is_empty());
        assert!(config.contexts.exclude.is_empty());
    }

    #[test]
    fn parses_context_lists() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[contexts]\ninclude = [\"home\", \"phone\"]\nexclude = [\"work\"]"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.contexts.include, vec!["home", "phone"]);
        assert_eq!(config.contexts.exclude, vec!["work"]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "outline = [not toml").unwrap();

        assert!(Config::load_from(file.path()).is_err());
    }
}

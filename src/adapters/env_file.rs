// SPDX-License-Identifier: MIT OR Apache-2.0

//! `.env` file discovery and parsing.
//!
//! The file is found by walking from a start directory (normally the one
//! holding the executable) up to the filesystem root; the first `.env` wins.
//!
//! Parsing rules:
//!
//! - blank lines and lines starting with `#` are skipped
//! - the first `=` separates key from value, so values may contain `=`
//! - keys and values are trimmed
//! - a line without `=` fails, naming its 1-based line number

use super::env_mapping::EnvironmentVariableMapping;
use super::env_var::{within_limits, EnvironmentKeyValueStore};
use crate::domain::{ConfigError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// The file name searched for.
pub const ENV_FILE_NAME: &str = ".env";

/// Maximum `.env` file size to read (prevents DoS)
const MAX_ENV_FILE_SIZE: u64 = 1024 * 1024;

/// Finds the nearest `.env` file at or above a start directory.
#[derive(Clone, Debug)]
pub struct EnvFileLocator {
    start: PathBuf,
}

impl EnvFileLocator {
    /// Searches upward from `start`.
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
        }
    }

    /// Searches upward from the directory of the running executable.
    pub fn from_current_exe() -> Result<Self> {
        let exe = std::env::current_exe()?;
        let dir = exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(dir))
    }

    /// Returns the directory the search starts from.
    pub fn start(&self) -> &Path {
        &self.start
    }

    /// Returns the first `.env` file found, nearest first.
    pub fn locate(&self) -> Option<PathBuf> {
        self.start
            .ancestors()
            .map(|dir| dir.join(ENV_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }
}

/// Parses `.env` content. `path` is used only for error messages.
///
/// A later duplicate of a key replaces the earlier value.
///
/// # Examples
///
/// ```
/// use instancecfg::adapters::parse_env_file;
/// use std::path::Path;
///
/// let values = parse_env_file(Path::new(".env"), "# comment\n\nFoo=Bar==\n").unwrap();
/// assert_eq!(values["Foo"], "Bar==");
///
/// let err = parse_env_file(Path::new(".env"), "A=1\nbroken\n").unwrap_err();
/// assert_eq!(err.to_string(), "Line 2 is not formatted correctly");
/// ```
pub fn parse_env_file(path: &Path, content: &str) -> Result<HashMap<String, String>> {
    let mut values = HashMap::new();

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::EnvFileFormat {
            path: path.to_path_buf(),
            line: index + 1,
        })?;
        let (key, value) = (key.trim(), value.trim());

        if !within_limits(key, value) {
            continue;
        }
        if values.insert(key.to_string(), value.to_string()).is_some() {
            tracing::warn!("Variable '{}' appears more than once in {}", key, path.display());
        }
    }

    Ok(values)
}

/// Reads and parses the `.env` file at `path`.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let metadata = fs::metadata(path)?;
    if metadata.len() > MAX_ENV_FILE_SIZE {
        return Err(ConfigError::SourceError {
            source_name: "env-file".to_string(),
            message: format!(
                "{} is too large ({} bytes, max {} bytes)",
                path.display(),
                metadata.len(),
                MAX_ENV_FILE_SIZE
            ),
            source: None,
        });
    }
    let content = fs::read_to_string(path)?;
    parse_env_file(path, &content)
}

impl EnvironmentKeyValueStore {
    /// Opens a read-only store over the `.env` file at `path`.
    pub fn from_env_file(path: &Path, mapping: EnvironmentVariableMapping) -> Result<Self> {
        let values = load_env_file(path)?;
        tracing::debug!("Loaded {} variables from {}", values.len(), path.display());
        Ok(Self::from_values("env-file", values, mapping))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProtectionLevel;
    use crate::ports::KeyValueStore;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<HashMap<String, String>> {
        parse_env_file(Path::new("test.env"), content)
    }

    #[test]
    fn test_skips_blank_and_comment_lines() {
        let values = parse("\n   \n# A=1\n  # B=2\nC=3\n").unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["C"], "3");
    }

    #[test]
    fn test_first_equals_is_the_delimiter() {
        let values = parse("Foo=Bar==").unwrap();
        assert_eq!(values["Foo"], "Bar==");
    }

    #[test]
    fn test_key_and_value_are_trimmed() {
        let values = parse("  Foo  =  Bar  \r\n").unwrap();
        assert_eq!(values["Foo"], "Bar");
    }

    #[test]
    fn test_leading_byte_order_mark_is_ignored() {
        let values = parse("\u{feff}AGENT_SERVER_URL=https://x\nAGENT_PORT=1\n").unwrap();
        assert_eq!(values["AGENT_SERVER_URL"], "https://x");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_empty_value_is_kept() {
        let values = parse("Foo=").unwrap();
        assert_eq!(values["Foo"], "");
    }

    #[test]
    fn test_line_without_equals_names_line_number() {
        let err = parse("# header\n\nA=1\nnot a pair\n").unwrap_err();
        match err {
            ConfigError::EnvFileFormat { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_later_duplicate_wins() {
        let values = parse("A=1\nA=2").unwrap();
        assert_eq!(values["A"], "2");
    }

    #[test]
    fn test_locator_walks_up_to_nearest_file() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(root.path().join(ENV_FILE_NAME), "A=root").unwrap();

        let locator = EnvFileLocator::new(&nested);
        assert_eq!(locator.locate(), Some(root.path().join(ENV_FILE_NAME)));

        fs::write(root.path().join("a").join(ENV_FILE_NAME), "A=mid").unwrap();
        assert_eq!(locator.locate(), Some(root.path().join("a").join(ENV_FILE_NAME)));
    }

    #[test]
    fn test_store_from_env_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(ENV_FILE_NAME);
        fs::write(&path, "SERVER_URL=https://example.com\nOTHER=1\n").unwrap();

        let mapping = EnvironmentVariableMapping::new().required("SERVER_URL", "Agent.ServerUrl");
        let store = EnvironmentKeyValueStore::from_env_file(&path, mapping).unwrap();
        assert_eq!(store.name(), "env-file");
        assert_eq!(
            store.get("agent.serverurl", ProtectionLevel::None).unwrap().as_deref(),
            Some("https://example.com")
        );
        assert_eq!(store.variables().len(), 1);
    }
}

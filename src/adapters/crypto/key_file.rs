// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key material persisted in a local file.
//!
//! The file holds `base64(key).base64(iv)` on one line. It is generated on
//! first use and loaded on every later one.

use crate::domain::{ConfigError, Result};
use crate::ports::{KeyMaterial, KeySource};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::OnceCell;
use rand::RngCore;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const IV_LEN: usize = 16;

/// A key source backed by a generated key file.
///
/// Generation writes a temporary file next to the target and persists it
/// without clobbering, so two processes racing to create the key agree on
/// whichever landed first.
#[derive(Debug)]
pub struct KeyFileSource {
    path: PathBuf,
    cached: OnceCell<KeyMaterial>,
}

impl KeyFileSource {
    /// Creates a key source for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Returns the key file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_or_generate(&self) -> Result<KeyMaterial> {
        match fs::read_to_string(&self.path) {
            Ok(content) => parse_key_file(&self.path, &content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => self.generate(),
            Err(e) => Err(e.into()),
        }
    }

    fn generate(&self) -> Result<KeyMaterial> {
        let mut rng = rand::thread_rng();
        let mut key = [0u8; 32];
        let mut iv = vec![0u8; IV_LEN];
        rng.fill_bytes(&mut key);
        rng.fill_bytes(&mut iv);

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        write!(tmp, "{}.{}", STANDARD.encode(key), STANDARD.encode(&iv))?;
        tmp.as_file().sync_all()?;
        restrict_permissions(tmp.path())?;

        match tmp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!("Generated machine key at {}", self.path.display());
                Ok(KeyMaterial { key, iv })
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::debug!(
                    "Machine key at {} was created concurrently; loading it",
                    self.path.display()
                );
                let content = fs::read_to_string(&self.path)?;
                parse_key_file(&self.path, &content)
            }
            Err(e) => Err(e.error.into()),
        }
    }
}

impl KeySource for KeyFileSource {
    fn name(&self) -> &str {
        "key-file"
    }

    fn load(&self) -> Result<KeyMaterial> {
        self.cached
            .get_or_try_init(|| self.load_or_generate())
            .cloned()
    }
}

fn parse_key_file(path: &Path, content: &str) -> Result<KeyMaterial> {
    let malformed = |message: &str| ConfigError::SourceError {
        source_name: "key-file".to_string(),
        message: format!("{} is malformed: {}", path.display(), message),
        source: None,
    };

    let (key, iv) = content
        .trim()
        .split_once('.')
        .ok_or_else(|| malformed("expected 'key.iv'"))?;
    let key = STANDARD
        .decode(key)
        .map_err(|_| malformed("key is not base64"))?;
    let iv = STANDARD.decode(iv).map_err(|_| malformed("iv is not base64"))?;
    let key: [u8; 32] = key
        .try_into()
        .map_err(|_| malformed("key must be 32 bytes"))?;

    Ok(KeyMaterial { key, iv })
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

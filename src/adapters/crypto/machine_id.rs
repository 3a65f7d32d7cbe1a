// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key material derived from the host's machine id.
//!
//! Used where the key file location is not writable, such as containers whose
//! `/etc` is read-only but which still carry a stable `/etc/machine-id`.

use crate::domain::{ConfigError, Result};
use crate::ports::{KeyMaterial, KeySource};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;

/// Default location of the machine id on Linux.
pub const DEFAULT_MACHINE_ID_PATH: &str = "/etc/machine-id";

const MACHINE_ID_IV: &[u8] = b"743677397A244326";

/// A key source that hashes the machine id into an AES-256 key.
#[derive(Debug, Clone)]
pub struct MachineIdKeySource {
    path: PathBuf,
}

impl MachineIdKeySource {
    /// Reads the machine id from [`DEFAULT_MACHINE_ID_PATH`].
    pub fn new() -> Self {
        Self::from_path(DEFAULT_MACHINE_ID_PATH)
    }

    /// Reads the machine id from another file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for MachineIdKeySource {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for MachineIdKeySource {
    fn name(&self) -> &str {
        "machine-id"
    }

    fn load(&self) -> Result<KeyMaterial> {
        let content = fs::read_to_string(&self.path)?;
        let id = content.lines().next().unwrap_or_default().trim();
        if id.is_empty() {
            return Err(ConfigError::source_error(
                "machine-id",
                format!("{} is empty", self.path.display()),
            ));
        }

        let digest = Sha256::digest(id.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);

        Ok(KeyMaterial {
            key,
            iv: MACHINE_ID_IV.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_same_id_same_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine-id");
        fs::write(&path, "0123456789abcdef0123456789abcdef\n").unwrap();

        let a = MachineIdKeySource::from_path(&path).load().unwrap();
        let b = MachineIdKeySource::from_path(&path).load().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.iv, MACHINE_ID_IV);
    }

    #[test]
    fn test_empty_machine_id_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("machine-id");
        fs::write(&path, "\n").unwrap();
        assert!(MachineIdKeySource::from_path(&path).load().is_err());
    }

    #[test]
    fn test_missing_machine_id_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = MachineIdKeySource::from_path(dir.path().join("absent"))
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings files on disk.
//!
//! A [`FileKeyValueStore`] reads and writes one settings document. Saves write
//! the whole snapshot to a temporary file in the same directory and rename it
//! over the target, so a crash never leaves a half-written document.

use super::dictionary::{DictionaryKeyValueStore, PersistenceShape, SettingsBacking, StoreOptions};
use super::formats::{format_for_path, JsonSettingsFormat};
use crate::domain::{ConfigError, Result};
use crate::ports::{MachineKeyEncryptor, SettingsFormat, SettingsMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Maximum allowed size for a settings document (10MB)
const MAX_SETTINGS_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A settings document at a path, in a given format.
#[derive(Clone)]
pub struct FileBacking {
    path: PathBuf,
    format: Arc<dyn SettingsFormat>,
}

impl FileBacking {
    /// Creates a backing for `path` in `format`.
    pub fn new(path: impl Into<PathBuf>, format: Arc<dyn SettingsFormat>) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_error(&self, message: &str, e: io::Error) -> ConfigError {
        ConfigError::SourceError {
            source_name: "settings-file".to_string(),
            message: format!("{}: {}", message, self.path.display()),
            source: Some(Box::new(e)),
        }
    }
}

impl SettingsBacking for FileBacking {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<SettingsMap> {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SettingsMap::new()),
            Err(e) => return Err(self.file_error("Failed to read file metadata", e)),
        };
        if metadata.len() > MAX_SETTINGS_FILE_SIZE {
            return Err(ConfigError::SourceError {
                source_name: "settings-file".to_string(),
                message: format!(
                    "Configuration file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_SETTINGS_FILE_SIZE
                ),
                source: None,
            });
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.file_error("Failed to read configuration file", e))?;
        self.format.parse_flat(&content)
    }

    fn persist(&self, settings: &SettingsMap, shape: PersistenceShape) -> Result<()> {
        let content = match shape {
            PersistenceShape::Flat => self.format.render_flat(settings)?,
            PersistenceShape::Hierarchical => self.format.render_hierarchical(settings)?,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// A key-value store persisted to a settings document.
///
/// # Examples
///
/// ```rust,no_run
/// use instancecfg::adapters::crypto::default_machine_key_encryptor;
/// use instancecfg::adapters::FileKeyValueStore;
/// use instancecfg::domain::ProtectionLevel;
/// use instancecfg::ports::{KeyValueStoreExt, WritableKeyValueStore, WritableKeyValueStoreExt};
/// use std::path::Path;
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let encryptor = default_machine_key_encryptor(Path::new("/etc/acme/machinekey"));
/// let store = FileKeyValueStore::open("/etc/acme/agent.config", encryptor);
/// store.set_bool("Agent.Listening", true, ProtectionLevel::None)?;
/// store.save()?;
/// # Ok(())
/// # }
/// ```
pub type FileKeyValueStore = DictionaryKeyValueStore<FileBacking>;

impl DictionaryKeyValueStore<FileBacking> {
    /// Opens a flat store, picking the format from the file extension. Writes are batched.
    pub fn open(path: impl Into<PathBuf>, encryptor: Arc<dyn MachineKeyEncryptor>) -> Self {
        let path = path.into();
        let format = format_for_path(&path);
        Self::with_format(path, format, encryptor, StoreOptions::default())
    }

    /// Opens a store with an explicit format and options.
    pub fn with_format(
        path: impl Into<PathBuf>,
        format: Arc<dyn SettingsFormat>,
        encryptor: Arc<dyn MachineKeyEncryptor>,
        options: StoreOptions,
    ) -> Self {
        let backing = FileBacking::new(path, format);
        let name = format!("{}-file", backing.format.name());
        Self::new(name, backing, encryptor, options)
    }

    /// Creates an export-only JSON store that nests keys on save.
    pub fn json_hierarchical(
        path: impl Into<PathBuf>,
        encryptor: Arc<dyn MachineKeyEncryptor>,
    ) -> Self {
        Self::with_format(
            path,
            Arc::new(JsonSettingsFormat),
            encryptor,
            StoreOptions::default().shape(PersistenceShape::Hierarchical),
        )
    }

    /// Returns the settings document path.
    pub fn path(&self) -> &Path {
        self.backing().path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::{FallbackMachineKeyEncryptor, StaticKeySource};
    use crate::adapters::formats::{XmlSettingsFormat, EMPTY_SETTINGS_DOCUMENT};
    use crate::domain::ProtectionLevel;
    use crate::ports::{KeyMaterial, KeySource, KeyValueStore, WritableKeyValueStore};
    use tempfile::TempDir;

    fn encryptor() -> Arc<dyn MachineKeyEncryptor> {
        let source: Arc<dyn KeySource> = Arc::new(StaticKeySource::new(
            "test",
            KeyMaterial {
                key: [8; 32],
                iv: vec![8; 16],
            },
        ));
        Arc::new(FallbackMachineKeyEncryptor::new(vec![source]))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::open(dir.path().join("absent.config"), encryptor());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_reads_empty_instance_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent.config");
        fs::write(&path, EMPTY_SETTINGS_DOCUMENT).unwrap();
        let store = FileKeyValueStore::open(&path, encryptor());
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a").join("b").join("agent.config");
        let store = FileKeyValueStore::open(&path, encryptor());
        store.set("k", Some("v"), ProtectionLevel::None).unwrap();
        store.save().unwrap();
        assert!(path.exists());

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_json_store_is_flat_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = FileKeyValueStore::open(&path, encryptor());
        store.set("Server.Port", Some("80"), ProtectionLevel::None).unwrap();
        store.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["Server.Port"], "80");
    }

    #[test]
    fn test_hierarchical_json_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("export.json");
        let store = FileKeyValueStore::json_hierarchical(&path, encryptor());
        store.set("Server.Port", Some("80"), ProtectionLevel::None).unwrap();
        store.set("Server.Host", Some("localhost"), ProtectionLevel::None).unwrap();
        store.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["Server"]["Host"], "localhost");

        let reopened = FileKeyValueStore::open(&path, encryptor());
        assert!(reopened.keys().is_err());
    }

    #[test]
    fn test_hierarchical_xml_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::with_format(
            dir.path().join("x.config"),
            Arc::new(XmlSettingsFormat),
            encryptor(),
            StoreOptions::default().shape(PersistenceShape::Hierarchical),
        );
        store.set("a.b", Some("c"), ProtectionLevel::None).unwrap();
        assert!(matches!(
            store.save(),
            Err(ConfigError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.config");
        let file = fs::File::create(&path).unwrap();
        file.set_len(MAX_SETTINGS_FILE_SIZE + 1).unwrap();
        let store = FileKeyValueStore::open(&path, encryptor());
        assert!(store.keys().unwrap_err().to_string().contains("too large"));
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory and export stores.

use super::crypto::UnavailableEncryptor;
use super::dictionary::{DictionaryKeyValueStore, PersistenceShape, SettingsBacking, StoreOptions};
use crate::domain::{ConfigError, Result};
use crate::ports::{MachineKeyEncryptor, SettingsFormat, SettingsMap};
use std::io::Write;
use std::sync::{Arc, Mutex, RwLock};

/// A snapshot held in memory. `save` replaces what [`MemoryBacking::persisted`] returns.
#[derive(Clone, Default)]
pub struct MemoryBacking {
    persisted: Arc<RwLock<SettingsMap>>,
}

impl MemoryBacking {
    /// Creates a backing that starts with `settings`.
    pub fn with_settings(settings: SettingsMap) -> Self {
        Self {
            persisted: Arc::new(RwLock::new(settings)),
        }
    }

    /// Returns the last saved snapshot.
    pub fn persisted(&self) -> Result<SettingsMap> {
        self.persisted
            .read()
            .map(|s| s.clone())
            .map_err(|_| ConfigError::lock_poisoned("in-memory"))
    }
}

impl SettingsBacking for MemoryBacking {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn load(&self) -> Result<SettingsMap> {
        self.persisted()
    }

    fn persist(&self, settings: &SettingsMap, _shape: PersistenceShape) -> Result<()> {
        let mut guard = self
            .persisted
            .write()
            .map_err(|_| ConfigError::lock_poisoned("in-memory"))?;
        *guard = settings.clone();
        Ok(())
    }
}

/// A key-value store that lives only in memory.
///
/// # Examples
///
/// ```
/// use instancecfg::adapters::InMemoryKeyValueStore;
/// use instancecfg::domain::ProtectionLevel;
/// use instancecfg::ports::{KeyValueStore, WritableKeyValueStore};
///
/// let store = InMemoryKeyValueStore::unprotected();
/// store.set("Name", Some("agent"), ProtectionLevel::None).unwrap();
/// assert_eq!(store.get("name", ProtectionLevel::None).unwrap().as_deref(), Some("agent"));
/// ```
pub type InMemoryKeyValueStore = DictionaryKeyValueStore<MemoryBacking>;

impl DictionaryKeyValueStore<MemoryBacking> {
    /// Creates an empty in-memory store.
    pub fn in_memory(encryptor: Arc<dyn MachineKeyEncryptor>) -> Self {
        Self::new("in-memory", MemoryBacking::default(), encryptor, StoreOptions::default())
    }

    /// Creates an empty in-memory store that cannot hold protected values.
    pub fn unprotected() -> Self {
        Self::in_memory(Arc::new(UnavailableEncryptor))
    }

    /// Creates an in-memory store pre-populated with raw settings.
    pub fn from_settings(settings: SettingsMap, encryptor: Arc<dyn MachineKeyEncryptor>) -> Self {
        Self::new(
            "in-memory",
            MemoryBacking::with_settings(settings),
            encryptor,
            StoreOptions::default(),
        )
    }
}

/// Renders each saved snapshot to an output stream, such as standard output.
pub struct WriterBacking {
    writer: Mutex<Box<dyn Write + Send>>,
    format: Arc<dyn SettingsFormat>,
}

impl WriterBacking {
    /// Creates a backing that renders with `format` into `writer`.
    pub fn new(writer: Box<dyn Write + Send>, format: Arc<dyn SettingsFormat>) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }
}

impl SettingsBacking for WriterBacking {
    fn describe(&self) -> String {
        format!("{} output", self.format.name())
    }

    fn load(&self) -> Result<SettingsMap> {
        Err(ConfigError::unsupported("export", "reads"))
    }

    fn persist(&self, settings: &SettingsMap, shape: PersistenceShape) -> Result<()> {
        let content = match shape {
            PersistenceShape::Flat => self.format.render_flat(settings)?,
            PersistenceShape::Hierarchical => self.format.render_hierarchical(settings)?,
        };
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| ConfigError::lock_poisoned("export"))?;
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// A write-only store that renders its snapshot to an output stream on save.
pub type ExportKeyValueStore = DictionaryKeyValueStore<WriterBacking>;

impl DictionaryKeyValueStore<WriterBacking> {
    /// Creates a write-only export store.
    pub fn export_to(
        writer: Box<dyn Write + Send>,
        format: Arc<dyn SettingsFormat>,
        shape: PersistenceShape,
        encryptor: Arc<dyn MachineKeyEncryptor>,
    ) -> Self {
        Self::new(
            "export",
            WriterBacking::new(writer, format),
            encryptor,
            StoreOptions::default().write_only(true).shape(shape),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::formats::JsonSettingsFormat;
    use crate::domain::{ProtectionLevel, SettingKey};
    use crate::ports::{KeyValueStore, WritableKeyValueStore};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_save_replaces_persisted_snapshot() {
        let backing = MemoryBacking::default();
        let store = DictionaryKeyValueStore::new(
            "in-memory",
            backing.clone(),
            Arc::new(UnavailableEncryptor),
            StoreOptions::default(),
        );
        store.set("a", Some("1"), ProtectionLevel::None).unwrap();
        assert!(backing.persisted().unwrap().is_empty());
        store.save().unwrap();
        assert_eq!(backing.persisted().unwrap()[&SettingKey::from("A")], "1");
    }

    #[test]
    fn test_unprotected_store_rejects_machine_key() {
        let store = InMemoryKeyValueStore::unprotected();
        assert!(store.set("k", Some("v"), ProtectionLevel::MachineKey).is_err());
    }

    #[test]
    fn test_export_renders_on_save_and_rejects_reads() {
        let buffer = SharedBuffer::default();
        let store = ExportKeyValueStore::export_to(
            Box::new(buffer.clone()),
            Arc::new(JsonSettingsFormat),
            PersistenceShape::Hierarchical,
            Arc::new(UnavailableEncryptor),
        );
        store.set("Server.Port", Some("80"), ProtectionLevel::None).unwrap();
        assert!(store.get("Server.Port", ProtectionLevel::None).is_err());
        store.save().unwrap();

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["Server"]["Port"], "80");
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dictionary-backed key-value store.
//!
//! Every writable store in this crate is a [`DictionaryKeyValueStore`]: an
//! in-memory [`SettingsMap`] loaded lazily from a [`SettingsBacking`] and
//! written back to it whole on [`save`](WritableKeyValueStore::save). Backings
//! decide where the snapshot lives (a file, the registry, memory, an output
//! stream); the store decides encryption, deletion of blank values and when to save.

use crate::domain::{ConfigError, ProtectionLevel, Result, SettingKey};
use crate::ports::{KeyValueStore, MachineKeyEncryptor, SettingsMap, WritableKeyValueStore};
use std::sync::{Arc, RwLock};

/// How a snapshot is laid out when persisted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PersistenceShape {
    /// One level of `key -> value`. Can be read back.
    #[default]
    Flat,
    /// Keys split on `.` and nested. Written for export only; the store starts
    /// empty instead of reading existing content.
    Hierarchical,
}

/// Per-store behavior switches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Save after every `set` and `remove`
    pub auto_save: bool,
    /// Reject reads; used for export targets
    pub write_only: bool,
    /// Layout of the persisted snapshot
    pub shape: PersistenceShape,
}

impl StoreOptions {
    /// Sets whether every write is saved immediately.
    pub fn auto_save(mut self, enabled: bool) -> Self {
        self.auto_save = enabled;
        self
    }

    /// Sets whether reads are rejected.
    pub fn write_only(mut self, enabled: bool) -> Self {
        self.write_only = enabled;
        self
    }

    /// Sets the persisted layout.
    pub fn shape(mut self, shape: PersistenceShape) -> Self {
        self.shape = shape;
        self
    }
}

/// Where a dictionary store's snapshot is loaded from and saved to.
pub trait SettingsBacking: Send + Sync {
    /// Describes the location for logs, e.g. a file path.
    fn describe(&self) -> String;

    /// Loads the flat snapshot. A missing location yields an empty map.
    fn load(&self) -> Result<SettingsMap>;

    /// Replaces the persisted snapshot with `settings`.
    fn persist(&self, settings: &SettingsMap, shape: PersistenceShape) -> Result<()>;
}

/// A key-value store holding its settings in memory over a [`SettingsBacking`].
pub struct DictionaryKeyValueStore<B> {
    name: String,
    backing: B,
    options: StoreOptions,
    encryptor: Arc<dyn MachineKeyEncryptor>,
    settings: RwLock<Option<SettingsMap>>,
}

impl<B: SettingsBacking> DictionaryKeyValueStore<B> {
    /// Creates a store over `backing`. Nothing is read until first access.
    pub fn new(
        name: impl Into<String>,
        backing: B,
        encryptor: Arc<dyn MachineKeyEncryptor>,
        options: StoreOptions,
    ) -> Self {
        Self {
            name: name.into(),
            backing,
            options,
            encryptor,
            settings: RwLock::new(None),
        }
    }

    /// Returns the store options.
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Returns the backing.
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// Returns a copy of the raw (possibly encrypted) settings.
    pub fn snapshot(&self) -> Result<SettingsMap> {
        self.with_settings(|settings| settings.clone())
    }

    fn starts_empty(&self) -> bool {
        self.options.write_only || self.options.shape == PersistenceShape::Hierarchical
    }

    fn ensure_loaded(&self) -> Result<()> {
        {
            let guard = self
                .settings
                .read()
                .map_err(|_| ConfigError::lock_poisoned(&self.name))?;
            if guard.is_some() {
                return Ok(());
            }
        }

        let mut guard = self
            .settings
            .write()
            .map_err(|_| ConfigError::lock_poisoned(&self.name))?;
        if guard.is_none() {
            let loaded = if self.starts_empty() {
                SettingsMap::new()
            } else {
                self.backing.load()?
            };
            tracing::debug!(
                "Loaded {} settings for store '{}' from {}",
                loaded.len(),
                self.name,
                self.backing.describe()
            );
            *guard = Some(loaded);
        }
        Ok(())
    }

    fn with_settings<T>(&self, f: impl FnOnce(&SettingsMap) -> T) -> Result<T> {
        self.ensure_loaded()?;
        let guard = self
            .settings
            .read()
            .map_err(|_| ConfigError::lock_poisoned(&self.name))?;
        Ok(f(guard.as_ref().unwrap_or(&SettingsMap::new())))
    }

    fn with_settings_mut<T>(&self, f: impl FnOnce(&mut SettingsMap) -> T) -> Result<T> {
        self.ensure_loaded()?;
        let mut guard = self
            .settings
            .write()
            .map_err(|_| ConfigError::lock_poisoned(&self.name))?;
        Ok(f(guard.get_or_insert_with(SettingsMap::new)))
    }

    fn reject_reads(&self) -> Result<()> {
        if self.options.write_only {
            Err(ConfigError::unsupported(&self.name, "reads"))
        } else {
            Ok(())
        }
    }

    fn after_write(&self) -> Result<()> {
        if self.options.auto_save {
            self.save_snapshot()
        } else {
            Ok(())
        }
    }

    fn save_snapshot(&self) -> Result<()> {
        let snapshot = self.snapshot()?;
        self.backing.persist(&snapshot, self.options.shape)?;
        tracing::debug!(
            "Saved {} settings for store '{}' to {}",
            snapshot.len(),
            self.name,
            self.backing.describe()
        );
        Ok(())
    }
}

impl<B: SettingsBacking> KeyValueStore for DictionaryKeyValueStore<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, protection: ProtectionLevel) -> Result<Option<String>> {
        self.reject_reads()?;
        let raw = self.with_settings(|settings| settings.get(&SettingKey::from(key)).cloned())?;
        match raw {
            Some(raw) if protection.is_protected() && !raw.trim().is_empty() => {
                self.encryptor.decrypt(&raw).map(Some)
            }
            other => Ok(other),
        }
    }

    fn keys(&self) -> Result<Vec<SettingKey>> {
        self.reject_reads()?;
        self.with_settings(|settings| settings.keys().cloned().collect())
    }
}

impl<B: SettingsBacking + 'static> WritableKeyValueStore for DictionaryKeyValueStore<B> {
    fn set(&self, key: &str, value: Option<&str>, protection: ProtectionLevel) -> Result<()> {
        let value = match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => return self.remove(key),
        };
        let stored = if protection.is_protected() {
            self.encryptor.encrypt(value)?
        } else {
            value.to_string()
        };

        self.with_settings_mut(|settings| {
            settings.insert(SettingKey::from(key), stored);
        })?;
        self.after_write()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.with_settings_mut(|settings| {
            settings.remove(&SettingKey::from(key));
        })?;
        self.after_write()
    }

    fn save(&self) -> Result<()> {
        self.save_snapshot()
    }

    fn as_reader(self: Arc<Self>) -> Arc<dyn KeyValueStore> {
        self
    }
}

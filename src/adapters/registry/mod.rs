// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registry hives and the registry-backed key-value store.

mod memory;
#[cfg(windows)]
mod windows;

pub use memory::MemoryHive;
#[cfg(windows)]
pub use windows::WindowsRegistryHive;

use super::dictionary::{DictionaryKeyValueStore, PersistenceShape, SettingsBacking, StoreOptions};
use crate::domain::{Result, SettingKey};
use crate::ports::registry::join_registry_path;
use crate::ports::{MachineKeyEncryptor, RegistryHive, SettingsMap};
use std::sync::Arc;

/// Returns the machine-wide hive for this platform.
///
/// Hosts without a registry get an empty [`MemoryHive`], so the legacy
/// registry strategy simply finds nothing.
pub fn default_registry_hive() -> Arc<dyn RegistryHive> {
    #[cfg(windows)]
    {
        Arc::new(WindowsRegistryHive::local_machine())
    }
    #[cfg(not(windows))]
    {
        Arc::new(MemoryHive::new())
    }
}

/// Settings stored as string values under one registry key.
///
/// Hierarchical saves turn each dotted key into nested subkeys with the last
/// segment as the value name.
#[derive(Clone)]
pub struct RegistryBacking {
    hive: Arc<dyn RegistryHive>,
    path: String,
}

impl RegistryBacking {
    /// Creates a backing for the key at `path`.
    pub fn new(hive: Arc<dyn RegistryHive>, path: impl Into<String>) -> Self {
        Self {
            hive,
            path: path.into(),
        }
    }
}

impl SettingsBacking for RegistryBacking {
    fn describe(&self) -> String {
        format!("{}:{}", self.hive.name(), self.path)
    }

    fn load(&self) -> Result<SettingsMap> {
        Ok(self
            .hive
            .values(&self.path)?
            .into_iter()
            .map(|(name, data)| (SettingKey::from(name), data))
            .collect())
    }

    fn persist(&self, settings: &SettingsMap, shape: PersistenceShape) -> Result<()> {
        match shape {
            PersistenceShape::Flat => {
                for (name, _) in self.hive.values(&self.path)? {
                    if !settings.contains_key(&SettingKey::from(name.as_str())) {
                        self.hive.delete_value(&self.path, &name)?;
                    }
                }
                for (key, value) in settings {
                    self.hive.set_value(&self.path, key.as_str(), value)?;
                }
            }
            PersistenceShape::Hierarchical => {
                self.hive.delete_tree(&self.path)?;
                for (key, value) in settings {
                    let segments: Vec<&str> = key.segments().collect();
                    let (leaf, parents) = match segments.split_last() {
                        Some(split) => split,
                        None => continue,
                    };
                    let path = parents
                        .iter()
                        .fold(self.path.clone(), |path, segment| join_registry_path(&path, segment));
                    self.hive.set_value(&path, leaf, value)?;
                }
            }
        }
        Ok(())
    }
}

/// A key-value store kept in a machine-wide registry key.
pub type RegistryKeyValueStore = DictionaryKeyValueStore<RegistryBacking>;

impl DictionaryKeyValueStore<RegistryBacking> {
    /// Opens the store at `path` in `hive`. Every write is saved immediately.
    pub fn registry(
        hive: Arc<dyn RegistryHive>,
        path: impl Into<String>,
        encryptor: Arc<dyn MachineKeyEncryptor>,
    ) -> Self {
        Self::new(
            "registry",
            RegistryBacking::new(hive, path),
            encryptor,
            StoreOptions::default().auto_save(true),
        )
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instances registered on this machine: descriptor files plus legacy registry entries.

use super::descriptor::{FileInstanceIndex, InstanceDescriptor};
use super::legacy_registry::LegacyRegistryInstanceStore;
use crate::adapters::FileKeyValueStore;
use crate::domain::{ApplicationInstanceRecord, ApplicationName, ConfigError, Result};
use crate::ports::{
    ApplicationInstanceStrategy, InstanceConfiguration, MachineKeyEncryptor, RegistryHive,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The highest-priority strategy: instances created explicitly on this machine.
///
/// Listing merges descriptor files with legacy registry entries; a descriptor
/// supersedes a registry entry of the same name. Loading an instance that is
/// only in the registry first copies it into the descriptor index.
pub struct PersistedInstanceStrategy {
    index: FileInstanceIndex,
    legacy: LegacyRegistryInstanceStore,
    encryptor: Arc<dyn MachineKeyEncryptor>,
}

impl PersistedInstanceStrategy {
    /// Creates the strategy over a descriptor directory and a registry hive.
    pub fn new(
        instances_directory: impl Into<PathBuf>,
        hive: Arc<dyn RegistryHive>,
        encryptor: Arc<dyn MachineKeyEncryptor>,
    ) -> Self {
        Self {
            index: FileInstanceIndex::new(instances_directory),
            legacy: LegacyRegistryInstanceStore::new(hive),
            encryptor,
        }
    }

    /// Returns the descriptor index.
    pub fn index(&self) -> &FileInstanceIndex {
        &self.index
    }

    /// Returns the legacy registry store.
    pub fn legacy(&self) -> &LegacyRegistryInstanceStore {
        &self.legacy
    }

    /// Returns the encryptor handed to instance stores.
    pub fn encryptor(&self) -> Arc<dyn MachineKeyEncryptor> {
        Arc::clone(&self.encryptor)
    }

    fn merged(&self, application: &ApplicationName) -> Result<Vec<InstanceDescriptor>> {
        let mut merged = self.index.list()?;
        for entry in self.legacy.list(application)? {
            if !merged.iter().any(|d| d.name == entry.name) {
                merged.push(entry);
            }
        }
        merged.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(merged)
    }

    /// Copies a registry-only instance into the descriptor index.
    ///
    /// Returns `true` if a descriptor was written. An existing descriptor
    /// short-circuits, so repeated calls are harmless.
    pub fn migrate(&self, record: &ApplicationInstanceRecord) -> Result<bool> {
        let name = &record.instance_name;
        if self.index.contains(name) {
            return Ok(false);
        }
        let Some(entry) = self.legacy.get(&record.application, name)? else {
            return Ok(false);
        };
        tracing::info!(
            "Migrating {} instance from registry - {}",
            record.application,
            name
        );
        self.index.register(&entry.name, entry.configuration_file_path)?;
        Ok(true)
    }

    /// Writes or updates the descriptor for `instance_name`.
    pub fn register(&self, instance_name: &str, configuration_file: &Path) -> Result<()> {
        self.index.register(instance_name, configuration_file)
    }

    /// Removes `instance_name` from the descriptor index and the legacy registry.
    ///
    /// Returns `true` if anything was removed.
    pub fn delete(&self, application: &ApplicationName, instance_name: &str) -> Result<bool> {
        let from_index = self.index.remove(instance_name)?;
        let from_registry = self.legacy.delete(application, instance_name)?;
        Ok(from_index || from_registry)
    }
}

impl ApplicationInstanceStrategy for PersistedInstanceStrategy {
    fn name(&self) -> &str {
        "persisted"
    }

    fn priority(&self) -> u8 {
        40
    }

    fn any_instances_configured(&self, application: &ApplicationName) -> Result<bool> {
        Ok(self.index.any()? || !self.legacy.list(application)?.is_empty())
    }

    fn list_instances(&self, application: &ApplicationName) -> Result<Vec<ApplicationInstanceRecord>> {
        Ok(self
            .merged(application)?
            .into_iter()
            .map(|d| ApplicationInstanceRecord::new(d.name, application.clone(), d.configuration_file_path))
            .collect())
    }

    fn loaded_configuration(
        &self,
        record: &ApplicationInstanceRecord,
    ) -> Result<Option<InstanceConfiguration>> {
        let Some(path) = record.locator.configuration_file() else {
            return Ok(None);
        };
        self.migrate(record)?;

        if !path.is_file() {
            return Err(ConfigError::ConfigurationFileNotFound {
                path: path.to_path_buf(),
            });
        }
        tracing::debug!("Loading configuration from {}", path.display());
        let store = Arc::new(FileKeyValueStore::open(path, self.encryptor()));
        Ok(Some(InstanceConfiguration::writable(store, Some(path.to_path_buf()))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::UnavailableEncryptor;
    use crate::adapters::formats::EMPTY_SETTINGS_DOCUMENT;
    use crate::adapters::strategies::legacy_registry::CONFIGURATION_FILE_PATH_VALUE;
    use crate::adapters::MemoryHive;
    use crate::domain::ProtectionLevel;
    use crate::ports::WritableKeyValueStore;
    use std::fs;
    use tempfile::TempDir;

    fn app() -> ApplicationName {
        ApplicationName::new("Acme", "Agent")
    }

    fn strategy(dir: &TempDir, hive: MemoryHive) -> PersistedInstanceStrategy {
        PersistedInstanceStrategy::new(
            dir.path().join("Instances"),
            Arc::new(hive),
            Arc::new(UnavailableEncryptor),
        )
    }

    #[test]
    fn test_descriptor_supersedes_registry_entry() {
        let dir = TempDir::new().unwrap();
        let hive = MemoryHive::new()
            .with_value("Software\\Acme\\Agent\\Default", CONFIGURATION_FILE_PATH_VALUE, "/old.config")
            .with_value("Software\\Acme\\Agent\\Legacy", CONFIGURATION_FILE_PATH_VALUE, "/legacy.config");
        let strategy = strategy(&dir, hive);
        strategy.register("Default", Path::new("/new.config")).unwrap();

        let listed = strategy.list_instances(&app()).unwrap();
        let names: Vec<&str> = listed.iter().map(|r| r.instance_name.as_str()).collect();
        assert_eq!(names, vec!["Default", "Legacy"]);
        assert_eq!(
            listed[0].locator.configuration_file(),
            Some(Path::new("/new.config"))
        );
    }

    #[test]
    fn test_migration_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let hive = MemoryHive::new().with_value(
            "Software\\Acme\\Agent\\Legacy",
            CONFIGURATION_FILE_PATH_VALUE,
            "/legacy.config",
        );
        let strategy = strategy(&dir, hive);
        let record = ApplicationInstanceRecord::new("Legacy", app(), "/legacy.config");

        assert!(strategy.migrate(&record).unwrap());
        assert!(strategy.index().contains("Legacy"));
        assert!(!strategy.migrate(&record).unwrap());
    }

    #[test]
    fn test_loaded_configuration_requires_file() {
        let dir = TempDir::new().unwrap();
        let strategy = strategy(&dir, MemoryHive::new());
        let record = ApplicationInstanceRecord::new("Default", app(), dir.path().join("missing.config"));
        assert!(matches!(
            strategy.loaded_configuration(&record),
            Err(ConfigError::ConfigurationFileNotFound { .. })
        ));
    }

    #[test]
    fn test_loaded_configuration_is_writable() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("agent.config");
        fs::write(&config, EMPTY_SETTINGS_DOCUMENT).unwrap();
        let strategy = strategy(&dir, MemoryHive::new());
        strategy.register("Default", &config).unwrap();

        let record = ApplicationInstanceRecord::new("Default", app(), &config);
        let loaded = strategy.loaded_configuration(&record).unwrap().unwrap();
        let writable = loaded.writable.unwrap();
        writable.set("Agent.Name", Some("x"), ProtectionLevel::None).unwrap();
        writable.save().unwrap();
        assert!(fs::read_to_string(&config).unwrap().contains("Agent.Name"));
    }

    #[test]
    fn test_delete_removes_both_sources() {
        let dir = TempDir::new().unwrap();
        let hive = MemoryHive::new().with_value(
            "Software\\Acme\\Agent\\Default",
            CONFIGURATION_FILE_PATH_VALUE,
            "/a.config",
        );
        let strategy = strategy(&dir, hive);
        strategy.register("Default", Path::new("/a.config")).unwrap();

        assert!(strategy.delete(&app(), "Default").unwrap());
        assert!(strategy.list_instances(&app()).unwrap().is_empty());
        assert!(!strategy.any_instances_configured(&app()).unwrap());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance entries kept in the registry by older releases.
//!
//! Layout: `Software\<Org>\<Product>\<instance>` with a string value
//! `ConfigurationFilePath`. Entries are only read, migrated and deleted;
//! new instances are never written here.

use super::descriptor::InstanceDescriptor;
use crate::domain::instance::instance_names_match;
use crate::domain::{ApplicationName, Result};
use crate::ports::registry::join_registry_path;
use crate::ports::RegistryHive;
use std::sync::Arc;

/// Name of the registry value holding the settings file path.
pub const CONFIGURATION_FILE_PATH_VALUE: &str = "ConfigurationFilePath";

/// Read/delete access to legacy registry instance entries.
#[derive(Clone)]
pub struct LegacyRegistryInstanceStore {
    hive: Arc<dyn RegistryHive>,
}

impl LegacyRegistryInstanceStore {
    /// Creates a store over `hive`.
    pub fn new(hive: Arc<dyn RegistryHive>) -> Self {
        Self { hive }
    }

    fn application_path(application: &ApplicationName) -> String {
        join_registry_path(
            &join_registry_path("Software", application.organization()),
            application.product(),
        )
    }

    /// Lists every legacy entry that has a settings file path.
    pub fn list(&self, application: &ApplicationName) -> Result<Vec<InstanceDescriptor>> {
        let root = Self::application_path(application);
        let mut found = Vec::new();
        for name in self.hive.subkeys(&root)? {
            let path = join_registry_path(&root, &name);
            match self.hive.get_value(&path, CONFIGURATION_FILE_PATH_VALUE)? {
                Some(file) => found.push(InstanceDescriptor::new(name, file)),
                None => tracing::debug!("Registry key {} has no {}", path, CONFIGURATION_FILE_PATH_VALUE),
            }
        }
        Ok(found)
    }

    /// Finds the entry for `instance_name`, ignoring case.
    pub fn get(
        &self,
        application: &ApplicationName,
        instance_name: &str,
    ) -> Result<Option<InstanceDescriptor>> {
        Ok(self
            .list(application)?
            .into_iter()
            .find(|d| instance_names_match(&d.name, instance_name)))
    }

    /// Deletes the entry for `instance_name`. Returns `false` if there was none.
    pub fn delete(&self, application: &ApplicationName, instance_name: &str) -> Result<bool> {
        let Some(entry) = self.get(application, instance_name)? else {
            return Ok(false);
        };
        let path = join_registry_path(&Self::application_path(application), &entry.name);
        self.hive.delete_tree(&path)?;
        tracing::info!("Deleted instance {} from registry", entry.name);
        Ok(true)
    }
}

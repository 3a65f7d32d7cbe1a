// SPDX-License-Identifier: MIT OR Apache-2.0

//! A `<Product>.config` file in the working directory.

use crate::adapters::FileKeyValueStore;
use crate::domain::{ApplicationInstanceRecord, ApplicationName, Result, DEFAULT_INSTANCE_NAME};
use crate::ports::{ApplicationInstanceStrategy, InstanceConfiguration, MachineKeyEncryptor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Contributes a `Default` instance when `<dir>/<Product>.config` exists.
///
/// Lowest priority and not part of the default strategy set.
pub struct WorkingDirectoryStrategy {
    directory: PathBuf,
    encryptor: Arc<dyn MachineKeyEncryptor>,
}

impl WorkingDirectoryStrategy {
    /// Looks in `directory`.
    pub fn new(directory: impl Into<PathBuf>, encryptor: Arc<dyn MachineKeyEncryptor>) -> Self {
        Self {
            directory: directory.into(),
            encryptor,
        }
    }

    /// Looks in the process working directory.
    pub fn current_dir(encryptor: Arc<dyn MachineKeyEncryptor>) -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?, encryptor))
    }

    /// Returns the file this strategy looks for.
    pub fn configuration_path(&self, application: &ApplicationName) -> PathBuf {
        self.directory.join(format!("{}.config", application.product()))
    }

    fn owns(&self, record: &ApplicationInstanceRecord, path: &Path) -> bool {
        path == self.configuration_path(&record.application)
    }
}

impl ApplicationInstanceStrategy for WorkingDirectoryStrategy {
    fn name(&self) -> &str {
        "working-directory"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn list_instances(&self, application: &ApplicationName) -> Result<Vec<ApplicationInstanceRecord>> {
        let path = self.configuration_path(application);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        tracing::debug!("Found {} in the working directory", path.display());
        Ok(vec![ApplicationInstanceRecord::new(
            DEFAULT_INSTANCE_NAME,
            application.clone(),
            path,
        )])
    }

    fn loaded_configuration(
        &self,
        record: &ApplicationInstanceRecord,
    ) -> Result<Option<InstanceConfiguration>> {
        let Some(path) = record.locator.configuration_file() else {
            return Ok(None);
        };
        if !self.owns(record, path) {
            return Ok(None);
        }
        let store = Arc::new(FileKeyValueStore::open(path, Arc::clone(&self.encryptor)));
        Ok(Some(InstanceConfiguration::writable(store, Some(path.to_path_buf()))))
    }
}

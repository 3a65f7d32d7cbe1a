// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resolved instance.

use crate::domain::{ApplicationName, ProtectionLevel, Result};
use crate::ports::{KeyValueStore, WritableKeyValueStore};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Setting holding an instance's home directory.
pub const HOME_DIRECTORY_SETTING: &str = "Instance.HomeDirectory";

/// Log directory name under an instance's home.
pub const LOG_DIRECTORY_NAME: &str = "Logs";

/// An instance chosen by the selector, with its settings ready to read.
pub struct LoadedApplicationInstance {
    application: ApplicationName,
    instance_name: Option<String>,
    configuration_path: Option<PathBuf>,
    store: Arc<dyn KeyValueStore>,
    writable: Option<Arc<dyn WritableKeyValueStore>>,
}

impl LoadedApplicationInstance {
    pub(crate) fn new(
        application: ApplicationName,
        instance_name: Option<String>,
        configuration_path: Option<PathBuf>,
        store: Arc<dyn KeyValueStore>,
        writable: Option<Arc<dyn WritableKeyValueStore>>,
    ) -> Self {
        Self {
            application,
            instance_name,
            configuration_path,
            store,
            writable,
        }
    }

    /// Returns the application.
    pub fn application(&self) -> &ApplicationName {
        &self.application
    }

    /// Returns the instance name; `None` when loaded straight from `--config`.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// Returns the settings file, for file-backed instances.
    pub fn configuration_path(&self) -> Option<&Path> {
        self.configuration_path.as_deref()
    }

    /// Returns the read view: contributed stores layered over the instance's own.
    pub fn store(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.store)
    }

    /// Returns the instance's own store when it accepts writes.
    pub fn writable_store(&self) -> Option<Arc<dyn WritableKeyValueStore>> {
        self.writable.clone()
    }

    /// Returns the home directory: the stored setting, else the settings file's directory.
    pub fn home_directory(&self) -> Result<Option<PathBuf>> {
        let stored = self
            .store
            .get(HOME_DIRECTORY_SETTING, ProtectionLevel::None)?
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        Ok(stored.or_else(|| {
            self.configuration_path
                .as_deref()
                .and_then(Path::parent)
                .map(Path::to_path_buf)
        }))
    }

    /// Returns `<home>/Logs`, where the host should send log output.
    pub fn log_directory(&self) -> Result<Option<PathBuf>> {
        Ok(self.home_directory()?.map(|home| home.join(LOG_DIRECTORY_NAME)))
    }
}

impl fmt::Debug for LoadedApplicationInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedApplicationInstance")
            .field("application", &self.application)
            .field("instance_name", &self.instance_name)
            .field("configuration_path", &self.configuration_path)
            .field("writable", &self.writable.is_some())
            .finish()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration from the nearest `.env` file.

use crate::adapters::env_file::EnvFileLocator;
use crate::adapters::{EnvironmentKeyValueStore, EnvironmentVariableMapping};
use crate::domain::{
    ApplicationInstanceRecord, ApplicationName, InstanceLocator, Result, DEFAULT_INSTANCE_NAME,
};
use crate::ports::environment::is_truthy;
use crate::ports::{
    ApplicationInstanceStrategy, ConfigurationContributor, EnvironmentReader,
    InstanceConfiguration, KeyValueStore,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Contributes a single `Default` instance backed by a `.env` file.
///
/// The instance exists only when a file is found, holds at least one mapped
/// variable, and provides every required variable. As a contributor, the
/// file's values are layered over any loaded instance when the activation
/// marker is set in the process environment.
pub struct EnvFileStrategy {
    locator: EnvFileLocator,
    mapping: EnvironmentVariableMapping,
    environment: Arc<dyn EnvironmentReader>,
}

impl EnvFileStrategy {
    /// Creates the strategy.
    pub fn new(
        locator: EnvFileLocator,
        mapping: EnvironmentVariableMapping,
        environment: Arc<dyn EnvironmentReader>,
    ) -> Self {
        Self {
            locator,
            mapping,
            environment,
        }
    }

    /// Loads the `.env` file if it is present and complete.
    ///
    /// Malformed files are an error; missing, empty or incomplete files yield `None`.
    pub fn load(&self) -> Result<Option<(PathBuf, EnvironmentKeyValueStore)>> {
        let Some(path) = self.locator.locate() else {
            tracing::debug!("No .env file found above {}", self.locator.start().display());
            return Ok(None);
        };
        tracing::debug!("Found .env file, {}", path.display());

        let store = EnvironmentKeyValueStore::from_env_file(&path, self.mapping.clone())?;
        if store.variables().is_empty() {
            tracing::debug!("{} holds no supported variables", path.display());
            return Ok(None);
        }
        let missing = store.missing_required();
        if !missing.is_empty() {
            tracing::debug!(
                "{} is missing required variable(s): {}",
                path.display(),
                missing.join(", ")
            );
            return Ok(None);
        }
        Ok(Some((path, store)))
    }
}

impl ApplicationInstanceStrategy for EnvFileStrategy {
    fn name(&self) -> &str {
        "env-file"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn list_instances(&self, application: &ApplicationName) -> Result<Vec<ApplicationInstanceRecord>> {
        Ok(self
            .load()?
            .map(|(path, _)| ApplicationInstanceRecord {
                instance_name: DEFAULT_INSTANCE_NAME.to_string(),
                application: application.clone(),
                locator: InstanceLocator::EnvFile(path),
            })
            .into_iter()
            .collect())
    }

    fn loaded_configuration(
        &self,
        record: &ApplicationInstanceRecord,
    ) -> Result<Option<InstanceConfiguration>> {
        if !matches!(record.locator, InstanceLocator::EnvFile(_)) {
            return Ok(None);
        }
        Ok(self
            .load()?
            .map(|(_, store)| InstanceConfiguration::read_only(Arc::new(store))))
    }
}

impl ConfigurationContributor for EnvFileStrategy {
    fn name(&self) -> &str {
        "env-file"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn contributed_configuration(
        &self,
        _application: &ApplicationName,
    ) -> Result<Option<Arc<dyn KeyValueStore>>> {
        let activated = self
            .environment
            .var(self.mapping.activation_variable())
            .is_some_and(|v| is_truthy(&v));
        if !activated {
            return Ok(None);
        }
        Ok(self.load()?.map(|(_, store)| {
            let store: Arc<dyn KeyValueStore> = Arc::new(store);
            store
        }))
    }
}

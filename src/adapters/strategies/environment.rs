// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration from process environment variables.

use crate::adapters::{EnvironmentKeyValueStore, EnvironmentVariableMapping};
use crate::domain::{
    ApplicationInstanceRecord, ApplicationName, ConfigError, InstanceLocator, Result,
    DEFAULT_INSTANCE_NAME,
};
use crate::ports::environment::is_truthy;
use crate::ports::{
    ApplicationInstanceStrategy, ConfigurationContributor, EnvironmentReader,
    InstanceConfiguration, KeyValueStore,
};
use std::sync::Arc;

/// Contributes a single `Default` instance read from the process environment.
///
/// Nothing happens unless the mapping's activation marker is truthy, so a
/// host that merely happens to export some of the variables is not affected.
/// Once activated, every required variable must be present.
pub struct EnvironmentStrategy {
    mapping: EnvironmentVariableMapping,
    environment: Arc<dyn EnvironmentReader>,
}

impl EnvironmentStrategy {
    /// Creates the strategy.
    pub fn new(mapping: EnvironmentVariableMapping, environment: Arc<dyn EnvironmentReader>) -> Self {
        Self {
            mapping,
            environment,
        }
    }

    /// Returns `true` if the activation marker is set.
    pub fn is_activated(&self) -> bool {
        self.environment
            .var(self.mapping.activation_variable())
            .is_some_and(|v| is_truthy(&v))
    }

    /// Snapshots the mapped variables when activated.
    ///
    /// Fails with `MissingEnvironmentVariables` if activated but incomplete.
    pub fn load(&self) -> Result<Option<EnvironmentKeyValueStore>> {
        if !self.is_activated() {
            tracing::debug!(
                "{} is not set; skipping environment configuration",
                self.mapping.activation_variable()
            );
            return Ok(None);
        }

        let store = EnvironmentKeyValueStore::from_environment(self.environment.as_ref(), self.mapping.clone());
        let names = store.missing_required();
        if !names.is_empty() {
            return Err(ConfigError::MissingEnvironmentVariables { names });
        }
        Ok(Some(store))
    }
}

impl ApplicationInstanceStrategy for EnvironmentStrategy {
    fn name(&self) -> &str {
        "environment"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn any_instances_configured(&self, _application: &ApplicationName) -> Result<bool> {
        Ok(self.is_activated())
    }

    fn list_instances(&self, application: &ApplicationName) -> Result<Vec<ApplicationInstanceRecord>> {
        Ok(self
            .load()?
            .map(|_| ApplicationInstanceRecord {
                instance_name: DEFAULT_INSTANCE_NAME.to_string(),
                application: application.clone(),
                locator: InstanceLocator::Environment,
            })
            .into_iter()
            .collect())
    }

    fn loaded_configuration(
        &self,
        record: &ApplicationInstanceRecord,
    ) -> Result<Option<InstanceConfiguration>> {
        if record.locator != InstanceLocator::Environment {
            return Ok(None);
        }
        Ok(self
            .load()?
            .map(|store| InstanceConfiguration::read_only(Arc::new(store))))
    }
}

impl ConfigurationContributor for EnvironmentStrategy {
    fn name(&self) -> &str {
        "environment"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn contributed_configuration(
        &self,
        _application: &ApplicationName,
    ) -> Result<Option<Arc<dyn KeyValueStore>>> {
        Ok(self.load()?.map(|store| {
            let store: Arc<dyn KeyValueStore> = Arc::new(store);
            store
        }))
    }
}

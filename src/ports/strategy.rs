// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration source strategy traits.
//!
//! A strategy knows about some set of application instances and can produce the
//! store for any of them. The selector consults strategies in priority order
//! (higher first) and treats the first one holding relevant data as authoritative.

use crate::domain::{ApplicationInstanceRecord, ApplicationName, Result};
use crate::ports::store::{KeyValueStore, WritableKeyValueStore};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// The settings of one instance as produced by a strategy.
#[derive(Clone)]
pub struct InstanceConfiguration {
    /// Read view of the instance's settings
    pub store: Arc<dyn KeyValueStore>,
    /// The same store when it accepts writes
    pub writable: Option<Arc<dyn WritableKeyValueStore>>,
    /// The settings file, for file-backed instances
    pub configuration_path: Option<PathBuf>,
}

impl InstanceConfiguration {
    /// Wraps a writable store.
    pub fn writable(store: Arc<dyn WritableKeyValueStore>, configuration_path: Option<PathBuf>) -> Self {
        Self {
            store: Arc::clone(&store).as_reader(),
            writable: Some(store),
            configuration_path,
        }
    }

    /// Wraps a read-only store.
    pub fn read_only(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            writable: None,
            configuration_path: None,
        }
    }
}

impl fmt::Debug for InstanceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceConfiguration")
            .field("store", &self.store.name())
            .field("writable", &self.writable.is_some())
            .field("configuration_path", &self.configuration_path)
            .finish()
    }
}

/// A source of application instances.
///
/// # Priority
///
/// Higher values are consulted first. The built-in strategies use:
///
/// - **40**: instance descriptor files (with the legacy registry folded in)
/// - **30**: `.env` file next to (or above) the executable
/// - **20**: process environment variables
/// - **10**: `<Product>.config` in the working directory (opt-in)
pub trait ApplicationInstanceStrategy: Send + Sync {
    /// Returns the strategy name used in logs.
    fn name(&self) -> &str;

    /// Returns the priority of this strategy.
    fn priority(&self) -> u8;

    /// Returns `true` if this strategy knows about at least one instance.
    fn any_instances_configured(&self, application: &ApplicationName) -> Result<bool> {
        Ok(!self.list_instances(application)?.is_empty())
    }

    /// Lists every instance this strategy knows about.
    fn list_instances(&self, application: &ApplicationName) -> Result<Vec<ApplicationInstanceRecord>>;

    /// Produces the settings for `record`, or `None` if the record is not this strategy's.
    fn loaded_configuration(
        &self,
        record: &ApplicationInstanceRecord,
    ) -> Result<Option<InstanceConfiguration>>;
}

/// A source of settings layered over whichever instance is loaded.
///
/// Contributed stores take precedence over the instance's own store.
pub trait ConfigurationContributor: Send + Sync {
    /// Returns the contributor name used in logs.
    fn name(&self) -> &str;

    /// Returns the contributor priority; higher values are layered on top.
    fn priority(&self) -> u8;

    /// Returns the contributed store, or `None` when this contributor is inactive.
    fn contributed_configuration(
        &self,
        application: &ApplicationName,
    ) -> Result<Option<Arc<dyn KeyValueStore>>>;
}

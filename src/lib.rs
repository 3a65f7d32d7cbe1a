// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-instance configuration resolution for long-running agents.
//!
//! One machine can run several named instances of the same application, each
//! with its own settings file and home directory. This crate decides which
//! instance the current process is, loads its settings as typed values, and
//! layers settings from a `.env` file or the process environment on top.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`SettingKey`, `SettingValue`, instance records, errors)
//! - **Ports**: Trait definitions (`KeyValueStore`, `SettingsFormat`, `MachineKeyEncryptor`,
//!   `ApplicationInstanceStrategy`)
//! - **Adapters**: File, memory, registry and environment stores; XML/JSON/YAML formats;
//!   machine key encryption; instance strategies
//! - **Service**: The instance selector that orchestrates everything
//!
//! # Features
//!
//! - **Named Instances**: Descriptor files under the machine configuration home,
//!   with legacy registry entries migrated on first load
//! - **Typed Settings**: Strings, integers, booleans, enums, JSON objects and more,
//!   with caller defaults for missing keys
//! - **Protected Values**: Machine-key encryption (DPAPI on Windows, AES-256-GCM elsewhere)
//! - **Environment Overlay**: `.env` files and environment variables layered over
//!   the instance's own settings
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML settings documents (default)
//! - `cli`: Enable the `clap` startup arguments (default)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use instancecfg::prelude::*;
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let mapping = EnvironmentVariableMapping::new()
//!     .required("AGENT_SERVER_URL", "Agent.ServerUrl")
//!     .sensitive("AGENT_API_KEY", "Agent.ApiKey");
//!
//! let selector = ApplicationInstanceSelector::with_defaults(
//!     ApplicationName::new("Acme", "Agent"),
//!     StartupArgs::from_env_args()?.into_request()?,
//!     None,
//!     mapping,
//! )?;
//!
//! let instance = selector.current()?;
//! let store = instance.store();
//! let port = store.get_int_or("Agent.Port", 10933, ProtectionLevel::None)?;
//! # let _ = port;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ApplicationInstanceRecord, ApplicationName, ConfigError, ProtectionLevel, Result,
        SettingKey, SettingValue, StartupInstanceRequest,
    };
    pub use crate::ports::{
        ApplicationInstanceStrategy, KeyValueStore, KeyValueStoreExt, WritableKeyValueStore,
        WritableKeyValueStoreExt,
    };
    pub use crate::service::{ApplicationInstanceSelector, LoadedApplicationInstance};

    pub use crate::adapters::{EnvironmentVariableMapping, FileKeyValueStore};
    // Re-export adapters based on feature flags
    #[cfg(feature = "cli")]
    pub use crate::adapters::StartupArgs;
}

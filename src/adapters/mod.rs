// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing store, format and strategy implementations.
//!
//! This module contains concrete implementations of the traits defined in the
//! ports layer: settings stores over files, memory, the registry and the
//! environment; document formats; machine key encryption; and the instance
//! strategies the selector consults.

pub mod aggregated;
pub mod crypto;
pub mod dictionary;
pub mod env_file;
pub mod env_mapping;
pub mod env_var;
pub mod file_store;
pub mod formats;
pub mod in_memory;
pub mod registry;
#[cfg(feature = "cli")]
pub mod startup_args;
pub mod strategies;

// Re-export adapters based on feature flags
pub use aggregated::AggregatedKeyValueStore;
pub use dictionary::{DictionaryKeyValueStore, PersistenceShape, SettingsBacking, StoreOptions};
pub use env_file::{load_env_file, parse_env_file, EnvFileLocator, ENV_FILE_NAME};
pub use env_mapping::{EnvironmentVariableMapping, VariableMapping, DEFAULT_ACTIVATION_VARIABLE};
pub use env_var::EnvironmentKeyValueStore;
pub use file_store::{FileBacking, FileKeyValueStore};
pub use in_memory::{ExportKeyValueStore, InMemoryKeyValueStore, MemoryBacking, WriterBacking};
pub use registry::{default_registry_hive, MemoryHive, RegistryBacking, RegistryKeyValueStore};
#[cfg(feature = "cli")]
pub use startup_args::StartupArgs;

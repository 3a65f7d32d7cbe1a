// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the interfaces the adapters implement and the service
//! layer consumes: stores, document formats, encryption, registry and
//! environment access, and instance strategies.

pub mod encryptor;
pub mod environment;
pub mod format;
pub mod registry;
pub mod store;
pub mod strategy;

// Re-export commonly used types
pub use encryptor::{KeyMaterial, KeySource, MachineKeyEncryptor};
pub use environment::{EnvironmentReader, MapEnvironment, ProcessEnvironment};
pub use format::SettingsFormat;
pub use registry::RegistryHive;
pub use store::{
    KeyValueStore, KeyValueStoreExt, SettingsMap, WritableKeyValueStore, WritableKeyValueStoreExt,
};
pub use strategy::{ApplicationInstanceStrategy, ConfigurationContributor, InstanceConfiguration};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core types.
//!
//! This module holds the vocabulary shared by every other layer: setting keys and
//! typed values, protection levels, application and instance identity, and errors.
//! It performs no I/O.

pub mod errors;
pub mod instance;
pub mod setting_key;
pub mod setting_value;

// Re-export commonly used types
pub use errors::{ConfigError, Result};
pub use instance::{
    ApplicationInstanceRecord, ApplicationName, InstanceLocator, StartupInstanceRequest,
    DEFAULT_INSTANCE_NAME,
};
pub use setting_key::SettingKey;
pub use setting_value::{ProtectionLevel, SettingKind, SettingValue};

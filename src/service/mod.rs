// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing instance resolution.
//!
//! [`ApplicationInstanceSelector`] turns a startup request into a
//! [`LoadedApplicationInstance`] by consulting the instance strategies in
//! priority order, and owns instance creation and deletion.

pub mod home;
pub mod loaded;
pub mod selector;

// Re-export commonly used types
pub use home::{MachineConfigurationHome, MACHINE_CONFIGURATION_HOME_VARIABLE, MACHINE_KEY_FILE_NAME};
pub use loaded::{LoadedApplicationInstance, HOME_DIRECTORY_SETTING, LOG_DIRECTORY_NAME};
pub use selector::{ApplicationInstanceSelector, ApplicationInstanceSelectorBuilder, LoadedHook};

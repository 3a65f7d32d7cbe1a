// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance source strategies.
//!
//! | Strategy | Priority | Instances |
//! |----------|----------|-----------|
//! | [`PersistedInstanceStrategy`] | 40 | descriptor files, plus legacy registry entries |
//! | [`EnvFileStrategy`] | 30 | one `Default` instance from a complete `.env` file |
//! | [`EnvironmentStrategy`] | 20 | one `Default` instance from activated environment variables |
//! | [`WorkingDirectoryStrategy`] | 10 | `<Product>.config` in the working directory (opt-in) |

mod descriptor;
mod env_file;
mod environment;
pub mod legacy_registry;
mod persisted;
mod working_directory;

pub use descriptor::{FileInstanceIndex, InstanceDescriptor};
pub use env_file::EnvFileStrategy;
pub use environment::EnvironmentStrategy;
pub use legacy_registry::LegacyRegistryInstanceStore;
pub use persisted::PersistedInstanceStrategy;
pub use working_directory::WorkingDirectoryStrategy;

// SPDX-License-Identifier: MIT OR Apache-2.0

//! The machine-wide configuration home.
//!
//! Instance descriptors and the machine key file live under this directory.
//! Resolution order:
//!
//! 1. an explicit path (normally `--machine-config-home`)
//! 2. the `INSTANCECFG_MACHINE_CONFIGURATION_HOME` environment variable
//! 3. `%ProgramData%\<Org>` on Windows, `/etc/<org>` elsewhere

use crate::domain::{ApplicationName, ConfigError, Result};
use crate::ports::EnvironmentReader;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the machine configuration home.
pub const MACHINE_CONFIGURATION_HOME_VARIABLE: &str = "INSTANCECFG_MACHINE_CONFIGURATION_HOME";

/// File name of the generated machine key, relative to the home.
pub const MACHINE_KEY_FILE_NAME: &str = "machinekey";

/// Where machine-wide configuration for an application lives.
///
/// # Examples
///
/// ```rust
/// use instancecfg::domain::ApplicationName;
/// use instancecfg::service::MachineConfigurationHome;
/// use std::path::Path;
///
/// let app = ApplicationName::new("Acme", "Agent");
/// let home = MachineConfigurationHome::from_path("/srv/acme");
/// assert_eq!(home.instances_directory(&app), Path::new("/srv/acme/Agent/Instances"));
/// assert_eq!(home.machine_key_path(), Path::new("/srv/acme/machinekey"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineConfigurationHome {
    root: PathBuf,
}

impl MachineConfigurationHome {
    /// Uses `root` as the home.
    pub fn from_path(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the home from an explicit path, the environment, or the platform default.
    pub fn resolve(
        application: &ApplicationName,
        explicit: Option<&Path>,
        environment: &dyn EnvironmentReader,
    ) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!("Using machine configuration home from arguments: {}", path.display());
            return Ok(Self::from_path(path));
        }

        if let Some(path) = environment
            .var(MACHINE_CONFIGURATION_HOME_VARIABLE)
            .filter(|v| !v.trim().is_empty())
        {
            tracing::debug!(
                "Using machine configuration home from {}: {}",
                MACHINE_CONFIGURATION_HOME_VARIABLE,
                path
            );
            return Ok(Self::from_path(path));
        }

        Self::platform_default(application, environment)
    }

    #[cfg(windows)]
    fn platform_default(
        application: &ApplicationName,
        environment: &dyn EnvironmentReader,
    ) -> Result<Self> {
        let program_data = environment
            .var("ProgramData")
            .ok_or_else(|| ConfigError::SourceError {
                source_name: "machine-home".to_string(),
                message: "The ProgramData environment variable is not set".to_string(),
                source: None,
            })?;
        Ok(Self::from_path(
            PathBuf::from(program_data).join(application.organization()),
        ))
    }

    #[cfg(not(windows))]
    fn platform_default(
        application: &ApplicationName,
        _environment: &dyn EnvironmentReader,
    ) -> Result<Self> {
        Ok(Self::from_path(
            PathBuf::from("/etc").join(application.organization().to_lowercase()),
        ))
    }

    /// Uses the per-user configuration directory, for unprivileged installs.
    pub fn per_user(application: &ApplicationName) -> Result<Self> {
        let dirs = ProjectDirs::from("", application.organization(), application.product())
            .ok_or_else(|| ConfigError::SourceError {
                source_name: "machine-home".to_string(),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;
        Ok(Self::from_path(dirs.config_dir()))
    }

    /// Returns the home directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding one descriptor per instance.
    pub fn instances_directory(&self, application: &ApplicationName) -> PathBuf {
        self.root.join(application.product()).join("Instances")
    }

    /// Returns the path of the generated machine key file.
    pub fn machine_key_path(&self) -> PathBuf {
        self.root.join(MACHINE_KEY_FILE_NAME)
    }
}

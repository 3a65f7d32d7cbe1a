// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application and instance identity.

use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the instance selected when several exist and none was requested.
pub const DEFAULT_INSTANCE_NAME: &str = "Default";

/// The application whose instances are being resolved.
///
/// `organization` scopes machine-wide paths (`/etc/<org>`, `HKLM\Software\<Org>`);
/// `product` scopes everything below it.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::ApplicationName;
///
/// let app = ApplicationName::new("Octopus", "Tentacle");
/// assert_eq!(app.to_string(), "Tentacle");
/// assert_eq!(app.organization(), "Octopus");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApplicationName {
    organization: String,
    product: String,
}

impl ApplicationName {
    /// Creates an application name.
    pub fn new(organization: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            product: product.into(),
        }
    }

    /// Returns the organization name.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Returns the product name.
    pub fn product(&self) -> &str {
        &self.product
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.product)
    }
}

/// Where an instance's settings live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstanceLocator {
    /// A settings file on disk.
    ConfigurationFile(PathBuf),
    /// A `.env` file.
    EnvFile(PathBuf),
    /// The process environment.
    Environment,
}

impl InstanceLocator {
    /// Returns the settings file path for file-backed instances.
    pub fn configuration_file(&self) -> Option<&Path> {
        match self {
            InstanceLocator::ConfigurationFile(path) => Some(path),
            _ => None,
        }
    }
}

/// A known instance of an application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationInstanceRecord {
    /// The instance name, as stored
    pub instance_name: String,
    /// The application the instance belongs to
    pub application: ApplicationName,
    /// Where the instance's settings are read from
    pub locator: InstanceLocator,
}

impl ApplicationInstanceRecord {
    /// Creates a record for a file-backed instance.
    pub fn new(
        instance_name: impl Into<String>,
        application: ApplicationName,
        configuration_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            instance_name: instance_name.into(),
            application,
            locator: InstanceLocator::ConfigurationFile(configuration_file.into()),
        }
    }

    /// Returns `true` if this is the default instance.
    pub fn is_default(&self) -> bool {
        is_default_instance_name(&self.instance_name)
    }
}

/// Returns `true` if `name` is the default instance name in any casing.
pub fn is_default_instance_name(name: &str) -> bool {
    instance_names_match(name, DEFAULT_INSTANCE_NAME)
}

/// Returns `true` if two instance names are equal ignoring case.
///
/// Case is folded per Unicode character, so `Ärger` matches `ärger`.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::instance::instance_names_match;
///
/// assert!(instance_names_match("Ärger", "äRGER"));
/// assert!(!instance_names_match("Ärger", "Arger"));
/// ```
pub fn instance_names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Returns the descriptor file stem for an instance name: lowercased, spaces as hyphens.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::instance::descriptor_file_stem;
///
/// assert_eq!(descriptor_file_stem("My Instance"), "my-instance");
/// ```
pub fn descriptor_file_stem(instance_name: &str) -> String {
    instance_name.replace(' ', "-").to_lowercase()
}

/// What the command layer asked to start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StartupInstanceRequest {
    /// Load settings directly from this file.
    ConfigFilePath(PathBuf),
    /// Load the instance with this name.
    NamedInstance(String),
    /// Pick whatever single instance is configured.
    #[default]
    Dynamic,
}

impl fmt::Display for StartupInstanceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupInstanceRequest::ConfigFilePath(path) => {
                write!(f, "configuration file {}", path.display())
            }
            StartupInstanceRequest::NamedInstance(name) => write!(f, "instance {}", name),
            StartupInstanceRequest::Dynamic => f.write_str("dynamic instance"),
        }
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for instance resolution and key-value stores.
//!
//! All errors use `thiserror`. Errors fall into three groups:
//!
//! - **Controlled** failures describe a situation the operator can fix (no instance
//!   configured, an ambiguous name, a malformed `.env` line). A command layer should
//!   print the message and exit non-zero. See [`ConfigError::is_controlled`].
//! - **Data** failures describe a stored value that cannot be coerced or decrypted.
//! - **Infrastructure** failures (I/O) are propagated unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for configuration operations.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::errors::ConfigError;
///
/// let error = ConfigError::EnvFileFormat {
///     path: "/opt/app/.env".into(),
///     line: 3,
/// };
/// assert!(error.is_controlled());
/// assert_eq!(error.to_string(), "Line 3 is not formatted correctly");
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A stored value could not be coerced to the requested type.
    #[error(
        "Unable to parse configuration key '{key}' as a '{target_type}'.{}",
        describe_raw(.raw_value)
    )]
    TypeConversionError {
        /// The key being converted
        key: String,
        /// The target type name
        target_type: String,
        /// The raw stored text; `None` when the value is protected
        raw_value: Option<String>,
        /// The underlying conversion error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No strategy knows about any instance of the application.
    #[error(
        "There are no instances of {application} configured on this machine. Please run the setup wizard, configure an instance using the command-line interface, specify a configuration file, or set the required environment variables."
    )]
    NoInstancesConfigured {
        /// The application name
        application: String,
    },

    /// The requested instance name matched nothing.
    #[error(
        "Instance {name} of {application} has not been configured on this machine. Available instances: {}.",
        .available.join(", ")
    )]
    InstanceNotFound {
        /// The application name
        application: String,
        /// The requested instance name
        name: String,
        /// Every instance name that is configured
        available: Vec<String>,
    },

    /// The requested name matched several instances case-insensitively but none exactly.
    #[error(
        "Instance {name} of {application} could not be matched to one of the existing instances: {}.",
        .candidates.join(", ")
    )]
    AmbiguousInstance {
        /// The application name
        application: String,
        /// The requested instance name
        name: String,
        /// The case-insensitive matches
        candidates: Vec<String>,
    },

    /// Several instances exist, none is the default, and no name was given.
    #[error(
        "There is more than one instance of {application} configured on this machine. Please pass --instance=INSTANCENAME when invoking this command to target a specific instance. Available instances: {}.",
        .available.join(", ")
    )]
    InstanceNameRequired {
        /// The application name
        application: String,
        /// Every instance name, sorted
        available: Vec<String>,
    },

    /// A new instance name differs from an existing one only by case.
    #[error(
        "Cannot create instance {name} of {application} because instance {existing} already exists. Instance names are not case sensitive."
    )]
    InstanceAlreadyExists {
        /// The application name
        application: String,
        /// The requested instance name
        name: String,
        /// The name already registered
        existing: String,
    },

    /// A settings file the caller pointed at does not exist.
    #[error("The configuration file at {} could not be found.", .path.display())]
    ConfigurationFileNotFound {
        /// The missing file
        path: PathBuf,
    },

    /// A `.env` line without a `=` delimiter.
    #[error("Line {line} is not formatted correctly")]
    EnvFileFormat {
        /// The file being parsed
        path: PathBuf,
        /// The 1-based line number
        line: usize,
    },

    /// Variables the environment mapping marks as required are absent.
    #[error("Required environment variable(s) not provided: {}", .names.join(", "))]
    MissingEnvironmentVariables {
        /// The missing variable names
        names: Vec<String>,
    },

    /// The startup arguments contradict each other.
    #[error("Invalid startup arguments: {message}")]
    InvalidStartupArguments {
        /// The error message
        message: String,
    },

    /// A store was asked to do something it does not support.
    #[error("The '{store}' store does not support {operation}")]
    UnsupportedOperation {
        /// The store name
        store: String,
        /// The rejected operation
        operation: String,
    },

    /// A single encrypt or decrypt attempt failed.
    #[error("Encryption error: {message}")]
    EncryptionError {
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Every configured machine key source failed.
    #[error(
        "All {} machine key sources failed: {}",
        .errors.len(),
        join_errors(.errors)
    )]
    AllKeySourcesFailed {
        /// The failure from each source, in the order they were tried
        errors: Vec<ConfigError>,
    },

    /// An error occurred in a configuration source or store.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the source that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to parse a settings document or descriptor.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An I/O error occurred while reading or writing configuration.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe_raw(raw: &Option<String>) -> String {
    match raw {
        Some(value) => format!(" Value was '{}'.", value),
        None => String::new(),
    }
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// Returns `true` for failures that should be shown to the operator as an
    /// actionable message rather than an internal error.
    pub fn is_controlled(&self) -> bool {
        matches!(
            self,
            ConfigError::NoInstancesConfigured { .. }
                | ConfigError::InstanceNotFound { .. }
                | ConfigError::AmbiguousInstance { .. }
                | ConfigError::InstanceNameRequired { .. }
                | ConfigError::InstanceAlreadyExists { .. }
                | ConfigError::ConfigurationFileNotFound { .. }
                | ConfigError::EnvFileFormat { .. }
                | ConfigError::MissingEnvironmentVariables { .. }
                | ConfigError::InvalidStartupArguments { .. }
        )
    }

    /// Creates a TypeConversionError, keeping the raw text only when it is not protected.
    pub fn conversion(
        key: impl Into<String>,
        target_type: impl Into<String>,
        raw_value: Option<&str>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ConfigError::TypeConversionError {
            key: key.into(),
            target_type: target_type.into(),
            raw_value: raw_value.map(str::to_string),
            source,
        }
    }

    /// Creates a SourceError without an underlying cause.
    pub fn source_error(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::SourceError {
            source_name: source_name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates the error reported when a store's lock was poisoned by a panicking writer.
    pub fn lock_poisoned(source_name: impl Into<String>) -> Self {
        Self::source_error(source_name, "lock poisoned")
    }

    /// Creates an EncryptionError from any underlying error.
    pub fn encryption(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConfigError::EncryptionError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a ParseError from any underlying error.
    pub fn parse(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConfigError::ParseError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates an UnsupportedOperation error.
    pub fn unsupported(store: impl Into<String>, operation: impl Into<String>) -> Self {
        ConfigError::UnsupportedOperation {
            store: store.into(),
            operation: operation.into(),
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

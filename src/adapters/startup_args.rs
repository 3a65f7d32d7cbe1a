// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup options that select an instance.
//!
//! Three options matter to instance resolution:
//! - `--instance NAME`: a named instance
//! - `--config PATH`: a settings file, bypassing instance lookup
//! - `--machine-config-home PATH`: where descriptors and the machine key live
//!
//! [`StartupArgs`] derives [`clap::Args`] for hosts that flatten it into their
//! own parser, and [`StartupArgs::scan`] pulls the same options out of an
//! arbitrary argument list for hosts that parse commands some other way.

use crate::domain::{ConfigError, Result, StartupInstanceRequest};
use clap::Args;
use std::path::PathBuf;

/// Instance selection options.
///
/// # Examples
///
/// ```rust
/// use instancecfg::adapters::StartupArgs;
/// use instancecfg::domain::StartupInstanceRequest;
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let args = StartupArgs::scan(["run", "--instance=Second", "--verbose"])?;
/// assert_eq!(
///     args.into_request()?,
///     StartupInstanceRequest::NamedInstance("Second".to_string())
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct StartupArgs {
    /// Name of the instance to use
    #[arg(long, value_name = "NAME", conflicts_with = "config")]
    pub instance: Option<String>,

    /// Settings file to use instead of a registered instance
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding instance descriptors and the machine key
    #[arg(long = "machine-config-home", value_name = "PATH")]
    pub machine_config_home: Option<PathBuf>,
}

impl StartupArgs {
    /// Extracts the startup options from `args`, ignoring everything else.
    ///
    /// Accepts `--opt=value` and `--opt value`. A later occurrence replaces an
    /// earlier one. Fails if an option has no value or both `--instance` and
    /// `--config` are given.
    pub fn scan<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<S> = args.into_iter().collect();
        let mut parsed = Self::default();

        let mut i = 0;
        while i < args.len() {
            let arg = args[i].as_ref();
            i += 1;

            let Some(option) = arg.strip_prefix("--") else {
                continue;
            };
            let (name, inline) = match option.split_once('=') {
                Some((name, value)) => (name, Some(value.to_string())),
                None => (option, None),
            };
            if !matches!(name, "instance" | "config" | "machine-config-home") {
                continue;
            }

            // Handle --key value format
            let value = match inline {
                Some(value) => value,
                None => match args.get(i).map(|next| next.as_ref()) {
                    Some(next) if !next.starts_with("--") => {
                        i += 1;
                        next.to_string()
                    }
                    _ => {
                        return Err(ConfigError::InvalidStartupArguments {
                            message: format!("--{} requires a value", name),
                        })
                    }
                },
            };

            match name {
                "instance" => parsed.instance = Some(value),
                "config" => parsed.config = Some(PathBuf::from(value)),
                _ => parsed.machine_config_home = Some(PathBuf::from(value)),
            }
        }

        parsed.validate()?;
        Ok(parsed)
    }

    /// Extracts the startup options from the process arguments.
    pub fn from_env_args() -> Result<Self> {
        Self::scan(std::env::args().skip(1))
    }

    fn validate(&self) -> Result<()> {
        if self.instance.is_some() && self.config.is_some() {
            return Err(ConfigError::InvalidStartupArguments {
                message: "--instance and --config cannot be used together".to_string(),
            });
        }
        Ok(())
    }

    /// Converts the options into a startup request.
    ///
    /// A blank `--instance` value counts as absent.
    pub fn into_request(self) -> Result<StartupInstanceRequest> {
        self.validate()?;
        if let Some(config) = self.config {
            return Ok(StartupInstanceRequest::ConfigFilePath(config));
        }
        match self.instance {
            Some(name) if !name.trim().is_empty() => Ok(StartupInstanceRequest::NamedInstance(name)),
            _ => Ok(StartupInstanceRequest::Dynamic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Host {
        #[command(flatten)]
        startup: StartupArgs,
        #[arg(long)]
        verbose: bool,
    }

    #[test]
    fn test_scan_both_forms() {
        let args = StartupArgs::scan([
            "--machine-config-home",
            "/srv/acme",
            "--config=/srv/agent.config",
            "--other",
            "x",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/srv/agent.config")));
        assert_eq!(args.machine_config_home, Some(PathBuf::from("/srv/acme")));
        assert_eq!(args.instance, None);
    }

    #[test]
    fn test_scan_rejects_instance_and_config() {
        let err = StartupArgs::scan(["--instance", "A", "--config", "/a.config"]).unwrap_err();
        assert!(err.is_controlled());
    }

    #[test]
    fn test_scan_requires_value() {
        assert!(StartupArgs::scan(["--instance"]).is_err());
        assert!(StartupArgs::scan(["--instance", "--config=/a"]).is_err());
    }

    #[test]
    fn test_into_request() {
        assert_eq!(
            StartupArgs::default().into_request().unwrap(),
            StartupInstanceRequest::Dynamic
        );
        let blank = StartupArgs {
            instance: Some(" ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.into_request().unwrap(), StartupInstanceRequest::Dynamic);
        let config = StartupArgs {
            config: Some(PathBuf::from("/a.config")),
            ..Default::default()
        };
        assert_eq!(
            config.into_request().unwrap(),
            StartupInstanceRequest::ConfigFilePath(PathBuf::from("/a.config"))
        );
    }

    #[test]
    fn test_flattened_into_host_parser() {
        let host = Host::try_parse_from(["agent", "--instance", "Second", "--verbose"]).unwrap();
        assert!(host.verbose);
        assert_eq!(host.startup.instance.as_deref(), Some("Second"));

        assert!(Host::try_parse_from(["agent", "--instance", "A", "--config", "/a"]).is_err());
    }
}

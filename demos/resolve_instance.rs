// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance resolution example for the instancecfg crate.
//!
//! This example demonstrates:
//! - Resolving the instance from `--instance` / `--config` / `--machine-config-home`
//! - Creating a default instance when none is configured
//! - Typed reads and writes against the instance's settings
//! - Overlaying settings from the environment
//!
//! To run this example:
//! ```bash
//! # Keep everything under a scratch directory
//! export INSTANCECFG_MACHINE_CONFIGURATION_HOME=/tmp/instancecfg-demo
//!
//! # First run creates the Default instance
//! cargo run --example resolve_instance
//!
//! # Override a setting from the environment
//! export INSTANCECFG_CONFIGURE_FROM_ENVIRONMENT=true
//! export DEMO_SERVER_URL="https://octopus.example"
//! export DEMO_PORT=10943
//! cargo run --example resolve_instance
//! ```

use instancecfg::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== instancecfg: Resolve Instance ===\n");

    let args = StartupArgs::from_env_args()?;
    let machine_home = args.machine_config_home.clone();
    let request = args.into_request()?;
    println!("Requested: {}", request);

    let mapping = EnvironmentVariableMapping::new()
        .required("DEMO_SERVER_URL", "Demo.ServerUrl")
        .optional("DEMO_PORT", "Demo.Port")
        .sensitive("DEMO_API_KEY", "Demo.ApiKey");

    let selector = ApplicationInstanceSelector::with_defaults(
        ApplicationName::new("Instancecfg", "Demo"),
        request,
        machine_home.as_deref(),
        mapping,
    )?;

    let instance = match selector.current() {
        Ok(instance) => instance,
        Err(ConfigError::NoInstancesConfigured { .. }) => {
            let config = std::env::temp_dir().join("instancecfg-demo").join("Demo.config");
            println!("No instances yet; creating Default at {}", config.display());
            selector.create_default_instance(&config, None)?
        }
        Err(e) if e.is_controlled() => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("\n--- Resolved Instance ---");
    println!("Name:          {}", instance.instance_name().unwrap_or("(config file)"));
    if let Some(path) = instance.configuration_path() {
        println!("Settings file: {}", path.display());
    }
    if let Some(logs) = instance.log_directory()? {
        println!("Log directory: {}", logs.display());
    }

    println!("\n--- Typed Reads ---");
    let store = instance.store();
    let port = store.get_int_or("Demo.Port", 10933, ProtectionLevel::None)?;
    let url = store.get_string_or("Demo.ServerUrl", "(not set)", ProtectionLevel::None)?;
    println!("Demo.Port      = {}", port);
    println!("Demo.ServerUrl = {}", url);

    println!("\n--- Writes ---");
    match instance.writable_store() {
        Some(writable) => {
            let runs = writable.get_int_or("Demo.Runs", 0, ProtectionLevel::None)? + 1;
            writable.set_int("Demo.Runs", runs, ProtectionLevel::None)?;
            writable.save()?;
            println!("Demo.Runs      = {}", runs);
        }
        None => println!("Instance is read-only (loaded from the environment)"),
    }

    println!("\n--- Known Instances ---");
    for record in selector.list_instances()? {
        println!("  {}", record.instance_name);
    }

    Ok(())
}

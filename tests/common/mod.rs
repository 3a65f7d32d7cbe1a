// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for the integration tests.

use instancecfg::adapters::crypto::{FallbackMachineKeyEncryptor, StaticKeySource};
use instancecfg::adapters::strategies::PersistedInstanceStrategy;
use instancecfg::adapters::{EnvironmentVariableMapping, MemoryHive};
use instancecfg::domain::{ApplicationName, Result};
use instancecfg::ports::{KeyMaterial, KeySource, MachineKeyEncryptor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Registry path prefix used by [`app`].
#[allow(dead_code)]
pub const LEGACY_ROOT: &str = "Software\\Acme\\Agent";

/// The application every test resolves.
#[allow(dead_code)]
pub fn app() -> ApplicationName {
    ApplicationName::new("Acme", "Agent")
}

/// Key material that never changes between runs.
#[allow(dead_code)]
pub fn material(byte: u8) -> KeyMaterial {
    KeyMaterial {
        key: [byte; 32],
        iv: vec![byte; 16],
    }
}

/// An AES encryptor over one fixed key.
#[allow(dead_code)]
pub fn test_encryptor() -> Arc<dyn MachineKeyEncryptor> {
    let source: Arc<dyn KeySource> = Arc::new(StaticKeySource::new("test", material(7)));
    Arc::new(FallbackMachineKeyEncryptor::new(vec![source]))
}

/// A persisted instance store rooted in `home`, with `hive` standing in for the registry.
#[allow(dead_code)]
pub fn persisted(home: &Path, hive: MemoryHive) -> Arc<PersistedInstanceStrategy> {
    Arc::new(PersistedInstanceStrategy::new(
        home.join("Agent").join("Instances"),
        Arc::new(hive),
        test_encryptor(),
    ))
}

/// The variable mapping used by the environment tests.
#[allow(dead_code)]
pub fn mapping() -> EnvironmentVariableMapping {
    EnvironmentVariableMapping::new()
        .required("AGENT_SERVER_URL", "Agent.ServerUrl")
        .optional("AGENT_PORT", "Agent.Port")
        .sensitive("AGENT_API_KEY", "Agent.ApiKey")
}

/// Writes `content` to `path`, creating parent directories.
#[allow(dead_code)]
pub fn write_file(path: &Path, content: &str) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
    path.to_path_buf()
}

/// A key source that counts how often it is asked for key material.
#[allow(dead_code)]
pub struct CountingKeySource {
    name: String,
    material: Option<KeyMaterial>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl CountingKeySource {
    /// A source that always fails.
    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            material: None,
            calls: AtomicUsize::new(0),
        })
    }

    /// A source that always yields `material`.
    pub fn working(name: &str, material: KeyMaterial) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            material: Some(material),
            calls: AtomicUsize::new(0),
        })
    }

    /// Returns how many times `load` was called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeySource for CountingKeySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<KeyMaterial> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.material.clone().ok_or_else(|| {
            instancecfg::domain::ConfigError::source_error(self.name.clone(), "no key available")
        })
    }
}

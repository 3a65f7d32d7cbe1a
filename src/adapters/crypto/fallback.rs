// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine key encryption over an ordered list of key sources.

use super::cipher;
use crate::domain::{ConfigError, Result};
use crate::ports::{KeyMaterial, KeySource, MachineKeyEncryptor};
use std::sync::Arc;

/// Key material held in memory, for keys injected from a secret store.
#[derive(Debug, Clone)]
pub struct StaticKeySource {
    name: String,
    material: KeyMaterial,
}

impl StaticKeySource {
    /// Creates a named source for `material`.
    pub fn new(name: impl Into<String>, material: KeyMaterial) -> Self {
        Self {
            name: name.into(),
            material,
        }
    }
}

impl KeySource for StaticKeySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<KeyMaterial> {
        Ok(self.material.clone())
    }
}

/// Encrypts with the first key source that works.
///
/// Both operations walk the sources in order and return the first success;
/// later sources are never touched. When every source fails, the individual
/// failures are returned together as [`ConfigError::AllKeySourcesFailed`].
/// This lets a host keep decrypting through a corrupt or rotated key.
///
/// # Examples
///
/// ```
/// use instancecfg::adapters::crypto::{FallbackMachineKeyEncryptor, StaticKeySource};
/// use instancecfg::ports::{KeyMaterial, KeySource, MachineKeyEncryptor};
/// use std::sync::Arc;
///
/// let material = KeyMaterial { key: [9; 32], iv: vec![1; 16] };
/// let source: Arc<dyn KeySource> = Arc::new(StaticKeySource::new("test", material));
/// let encryptor = FallbackMachineKeyEncryptor::new(vec![source]);
///
/// let sealed = encryptor.encrypt("hunter2").unwrap();
/// assert_eq!(encryptor.decrypt(&sealed).unwrap(), "hunter2");
/// ```
#[derive(Clone)]
pub struct FallbackMachineKeyEncryptor {
    sources: Vec<Arc<dyn KeySource>>,
}

impl FallbackMachineKeyEncryptor {
    /// Creates an encryptor over `sources`, tried in order.
    pub fn new(sources: Vec<Arc<dyn KeySource>>) -> Self {
        Self { sources }
    }

    fn first_success<T>(
        &self,
        operation: &str,
        attempt: impl Fn(&KeyMaterial) -> Result<T>,
    ) -> Result<T> {
        let mut errors = Vec::new();
        for source in &self.sources {
            match source.load().and_then(|material| attempt(&material)) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::debug!(
                        "Machine key source '{}' failed to {}: {}",
                        source.name(),
                        operation,
                        e
                    );
                    errors.push(e);
                }
            }
        }
        Err(ConfigError::AllKeySourcesFailed { errors })
    }
}

impl MachineKeyEncryptor for FallbackMachineKeyEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.first_success("encrypt", |material| cipher::seal(material, plaintext))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self.first_success("decrypt", |material| cipher::open(material, ciphertext))
    }
}

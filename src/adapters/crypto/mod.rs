// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protected value codecs.
//!
//! On Windows values are protected with DPAPI at machine scope and no key is
//! managed here. Elsewhere an AES-256-GCM key is kept in a generated key file,
//! with the host machine id as a fallback source.

mod cipher;
#[cfg(windows)]
mod dpapi;
mod fallback;
mod key_file;
mod machine_id;

#[cfg(windows)]
pub use dpapi::DpapiEncryptor;
pub use fallback::{FallbackMachineKeyEncryptor, StaticKeySource};
pub use key_file::KeyFileSource;
pub use machine_id::{MachineIdKeySource, DEFAULT_MACHINE_ID_PATH};

#[cfg(not(windows))]
use crate::ports::KeySource;
use crate::ports::MachineKeyEncryptor;
use std::path::Path;
use std::sync::Arc;

/// Returns the encryptor for this platform.
///
/// `key_file` is only used where there is no native protected storage.
#[cfg(windows)]
pub fn default_machine_key_encryptor(key_file: &Path) -> Arc<dyn MachineKeyEncryptor> {
    let _ = key_file;
    Arc::new(DpapiEncryptor)
}

/// Returns the encryptor for this platform.
///
/// `key_file` is only used where there is no native protected storage.
#[cfg(not(windows))]
pub fn default_machine_key_encryptor(key_file: &Path) -> Arc<dyn MachineKeyEncryptor> {
    let key_file: Arc<dyn KeySource> = Arc::new(KeyFileSource::new(key_file));
    let machine_id: Arc<dyn KeySource> = Arc::new(MachineIdKeySource::new());
    Arc::new(FallbackMachineKeyEncryptor::new(vec![key_file, machine_id]))
}

/// An encryptor for stores that never hold protected values; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEncryptor;

impl MachineKeyEncryptor for UnavailableEncryptor {
    fn encrypt(&self, _plaintext: &str) -> crate::domain::Result<String> {
        Err(crate::domain::ConfigError::unsupported(
            "unprotected",
            "protected values",
        ))
    }

    fn decrypt(&self, _ciphertext: &str) -> crate::domain::Result<String> {
        Err(crate::domain::ConfigError::unsupported(
            "unprotected",
            "protected values",
        ))
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protected value encryption traits.

use crate::domain::Result;
use std::fmt;

/// Encrypts values written under [`ProtectionLevel::MachineKey`](crate::domain::ProtectionLevel).
///
/// Ciphertext is returned as text so it can be stored anywhere a plain value can.
pub trait MachineKeyEncryptor: Send + Sync {
    /// Encrypts `plaintext`.
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Decrypts text produced by [`encrypt`](Self::encrypt).
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// Symmetric key material for the non-native encryptor.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    /// The AES-256 key
    pub key: [u8; 32],
    /// The persisted IV; bound to every ciphertext as associated data
    pub iv: Vec<u8>,
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"<redacted>")
            .field("iv_len", &self.iv.len())
            .finish()
    }
}

/// A place key material can be obtained from.
///
/// Sources are tried in order by the fallback encryptor; a source that cannot
/// produce a key returns an error and the next one is tried.
pub trait KeySource: Send + Sync {
    /// Returns a short identifier used in logs and aggregated errors.
    fn name(&self) -> &str;

    /// Loads (or creates) the key material.
    fn load(&self) -> Result<KeyMaterial>;
}

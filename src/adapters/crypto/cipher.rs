// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM sealing with a per-value random nonce.
//!
//! Ciphertext text is `base64(nonce || ciphertext || tag)`. The key source's IV
//! is bound as associated data, so a value sealed under one source never opens
//! under another even if the keys happened to match.

use crate::domain::{ConfigError, Result};
use crate::ports::KeyMaterial;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

fn cipher(material: &KeyMaterial) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&material.key))
}

/// Encrypts `plaintext` under `material`.
pub(crate) fn seal(material: &KeyMaterial, plaintext: &str) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);

    let sealed = cipher(material)
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext.as_bytes(),
                aad: &material.iv,
            },
        )
        .map_err(|_| ConfigError::EncryptionError {
            message: "AES-GCM encryption failed".to_string(),
            source: None,
        })?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(STANDARD.encode(out))
}

/// Decrypts text produced by [`seal`].
pub(crate) fn open(material: &KeyMaterial, ciphertext: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(ciphertext.trim())
        .map_err(|e| ConfigError::encryption("protected value is not valid base64", e))?;
    if bytes.len() < NONCE_LEN + TAG_LEN {
        return Err(ConfigError::EncryptionError {
            message: "protected value is too short".to_string(),
            source: None,
        });
    }

    let (nonce, sealed) = bytes.split_at(NONCE_LEN);
    let plain = cipher(material)
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: sealed,
                aad: &material.iv,
            },
        )
        .map_err(|_| ConfigError::EncryptionError {
            message: "protected value could not be decrypted with this machine key".to_string(),
            source: None,
        })?;

    String::from_utf8(plain)
        .map_err(|e| ConfigError::encryption("decrypted value is not valid UTF-8", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material(fill: u8) -> KeyMaterial {
        KeyMaterial {
            key: [fill; 32],
            iv: b"0123456789abcdef".to_vec(),
        }
    }

    #[test]
    fn test_seal_then_open() {
        let m = material(7);
        let sealed = seal(&m, "hunter2").unwrap();
        assert_ne!(sealed, "hunter2");
        assert_eq!(open(&m, &sealed).unwrap(), "hunter2");
    }

    #[test]
    fn test_nonce_differs_per_value() {
        let m = material(7);
        assert_ne!(seal(&m, "same").unwrap(), seal(&m, "same").unwrap());
    }

    #[test]
    fn test_open_with_other_key_fails() {
        let sealed = seal(&material(1), "secret").unwrap();
        assert!(open(&material(2), &sealed).is_err());
    }

    #[test]
    fn test_open_with_other_iv_fails() {
        let sealed = seal(&material(1), "secret").unwrap();
        let mut other = material(1);
        other.iv = b"fedcba9876543210".to_vec();
        assert!(open(&other, &sealed).is_err());
    }

    #[test]
    fn test_open_plain_text_fails() {
        assert!(open(&material(1), "not encrypted at all").is_err());
        assert!(open(&material(1), "AAAA").is_err());
    }
}

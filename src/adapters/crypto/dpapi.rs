// SPDX-License-Identifier: MIT OR Apache-2.0

//! Windows Data Protection API with machine scope.

use crate::domain::{ConfigError, Result};
use crate::ports::MachineKeyEncryptor;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::ptr;
use windows_sys::Win32::Foundation::LocalFree;
use windows_sys::Win32::Security::Cryptography::{
    CryptProtectData, CryptUnprotectData, CRYPTPROTECT_LOCAL_MACHINE, CRYPTPROTECT_UI_FORBIDDEN,
    CRYPT_INTEGER_BLOB,
};

/// Encrypts with DPAPI so that any account on this machine can decrypt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpapiEncryptor;

impl MachineKeyEncryptor for DpapiEncryptor {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let sealed = transform(plaintext.as_bytes(), Direction::Protect)?;
        Ok(STANDARD.encode(sealed))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| ConfigError::encryption("protected value is not valid base64", e))?;
        let plain = transform(&bytes, Direction::Unprotect)?;
        String::from_utf8(plain)
            .map_err(|e| ConfigError::encryption("decrypted value is not valid UTF-8", e))
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Protect,
    Unprotect,
}

fn transform(data: &[u8], direction: Direction) -> Result<Vec<u8>> {
    let len = u32::try_from(data.len()).map_err(|e| ConfigError::encryption("value too large", e))?;
    let input = CRYPT_INTEGER_BLOB {
        cbData: len,
        pbData: data.as_ptr() as *mut u8,
    };
    let mut output = CRYPT_INTEGER_BLOB {
        cbData: 0,
        pbData: ptr::null_mut(),
    };
    let flags = CRYPTPROTECT_LOCAL_MACHINE | CRYPTPROTECT_UI_FORBIDDEN;

    // SAFETY: `input` points at `data`, which outlives the call; DPAPI does not
    // write through pbData of the input blob. On success `output` owns a
    // LocalAlloc'd buffer that is copied and freed below.
    let ok = unsafe {
        match direction {
            Direction::Protect => CryptProtectData(
                &input,
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                flags,
                &mut output,
            ),
            Direction::Unprotect => CryptUnprotectData(
                &input,
                ptr::null_mut(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                flags,
                &mut output,
            ),
        }
    };
    if ok == 0 {
        let operation = match direction {
            Direction::Protect => "CryptProtectData failed",
            Direction::Unprotect => "CryptUnprotectData failed",
        };
        return Err(ConfigError::encryption(
            operation,
            std::io::Error::last_os_error(),
        ));
    }

    // SAFETY: DPAPI reported success, so pbData/cbData describe a valid buffer.
    let bytes = unsafe { std::slice::from_raw_parts(output.pbData, output.cbData as usize) }.to_vec();
    // SAFETY: the buffer was allocated by DPAPI with LocalAlloc.
    unsafe {
        LocalFree(output.pbData as _);
    }
    Ok(bytes)
}

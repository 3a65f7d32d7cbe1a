// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Windows registry, local machine hive, 64-bit view.

use crate::domain::Result;
use crate::ports::RegistryHive;
use std::io;
use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ, KEY_WOW64_64KEY, KEY_WRITE};
use winreg::RegKey;

/// `HKEY_LOCAL_MACHINE` through `winreg`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistryHive;

impl WindowsRegistryHive {
    /// Creates a handle to the local machine hive.
    pub fn local_machine() -> Self {
        WindowsRegistryHive
    }

    fn open(&self, path: &str, flags: u32) -> io::Result<Option<RegKey>> {
        match RegKey::predef(HKEY_LOCAL_MACHINE).open_subkey_with_flags(path, flags) {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn ignore_missing(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

impl RegistryHive for WindowsRegistryHive {
    fn name(&self) -> &str {
        "windows-registry"
    }

    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        match self.open(path, KEY_READ | KEY_WOW64_64KEY)? {
            Some(key) => Ok(key.enum_keys().collect::<io::Result<Vec<String>>>()?),
            None => Ok(Vec::new()),
        }
    }

    fn values(&self, path: &str) -> Result<Vec<(String, String)>> {
        let Some(key) = self.open(path, KEY_READ | KEY_WOW64_64KEY)? else {
            return Ok(Vec::new());
        };
        let mut values = Vec::new();
        for entry in key.enum_values() {
            let (name, _) = entry?;
            match key.get_value::<String, _>(&name) {
                Ok(data) => values.push((name, data)),
                Err(e) => tracing::debug!("Skipping non-string registry value '{}': {}", name, e),
            }
        }
        Ok(values)
    }

    fn get_value(&self, path: &str, name: &str) -> Result<Option<String>> {
        let Some(key) = self.open(path, KEY_READ | KEY_WOW64_64KEY)? else {
            return Ok(None);
        };
        match key.get_value::<String, _>(name) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_value(&self, path: &str, name: &str, data: &str) -> Result<()> {
        let (key, _) = RegKey::predef(HKEY_LOCAL_MACHINE)
            .create_subkey_with_flags(path, KEY_WRITE | KEY_WOW64_64KEY)?;
        key.set_value(name, &data.to_string())?;
        Ok(())
    }

    fn delete_value(&self, path: &str, name: &str) -> Result<()> {
        if let Some(key) = self.open(path, KEY_WRITE | KEY_WOW64_64KEY)? {
            ignore_missing(key.delete_value(name))?;
        }
        Ok(())
    }

    fn delete_tree(&self, path: &str) -> Result<()> {
        ignore_missing(RegKey::predef(HKEY_LOCAL_MACHINE).delete_subkey_all(path))?;
        Ok(())
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store traits.
//!
//! This module defines the read contract every settings store implements
//! ([`KeyValueStore`]), the write contract of stores that own their data
//! ([`WritableKeyValueStore`]), and typed extension traits layered over both.
//!
//! Stores deal in raw text. The typed helpers encode and decode through
//! [`SettingValue`], so adding a store never means re-implementing coercion.

use crate::domain::{ConfigError, ProtectionLevel, Result, SettingKey, SettingKind, SettingValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The in-memory shape of a flat store: one raw value per case-insensitive key,
/// iterated in key order.
pub type SettingsMap = BTreeMap<SettingKey, String>;

/// A readable settings store.
///
/// `get` returns `Ok(None)` when the key is absent and `Ok(Some(""))` when an
/// empty value was stored explicitly. Aggregation relies on that distinction.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; a store lives for the whole process.
pub trait KeyValueStore: Send + Sync {
    /// Returns a short name used in logs and errors.
    fn name(&self) -> &str;

    /// Retrieves the raw value for `key`, decrypting it when `protection` requires.
    ///
    /// Reading a value with a different protection level than it was written with
    /// fails to decrypt rather than returning ciphertext as plaintext.
    fn get(&self, key: &str, protection: ProtectionLevel) -> Result<Option<String>>;

    /// Returns every key currently held by the store.
    fn keys(&self) -> Result<Vec<SettingKey>>;
}

/// A settings store that accepts writes.
pub trait WritableKeyValueStore: KeyValueStore {
    /// Writes `value` under `key`. `None`, empty or whitespace-only values delete the key.
    fn set(&self, key: &str, value: Option<&str>, protection: ProtectionLevel) -> Result<()>;

    /// Deletes `key` if present.
    fn remove(&self, key: &str) -> Result<()>;

    /// Persists the full current snapshot to the backing medium.
    fn save(&self) -> Result<()>;

    /// Returns this store as a read-only handle.
    fn as_reader(self: Arc<Self>) -> Arc<dyn KeyValueStore>;
}

/// Typed reads for any [`KeyValueStore`].
///
/// A missing key and a blank stored value both yield the caller's default.
///
/// # Examples
///
/// ```
/// use instancecfg::adapters::InMemoryKeyValueStore;
/// use instancecfg::domain::ProtectionLevel;
/// use instancecfg::ports::{KeyValueStoreExt, WritableKeyValueStoreExt};
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let store = InMemoryKeyValueStore::unprotected();
/// store.set_int("Server.Port", 10933, ProtectionLevel::None)?;
/// assert_eq!(store.get_int_or("Server.Port", 80, ProtectionLevel::None)?, 10933);
/// assert_eq!(store.get_int_or("Server.Missing", 80, ProtectionLevel::None)?, 80);
/// # Ok(())
/// # }
/// ```
pub trait KeyValueStoreExt: KeyValueStore {
    /// Reads and decodes a value as `kind`.
    fn get_value(
        &self,
        key: &str,
        kind: SettingKind,
        protection: ProtectionLevel,
    ) -> Result<Option<SettingValue>> {
        match self.get(key, protection)? {
            Some(raw) if !raw.trim().is_empty() => {
                SettingValue::decode(key, kind, &raw, protection.is_protected()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Reads text, returning `default` only when the key is absent.
    fn get_string_or(&self, key: &str, default: &str, protection: ProtectionLevel) -> Result<String> {
        Ok(self
            .get(key, protection)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Reads an integer.
    fn get_int(&self, key: &str, protection: ProtectionLevel) -> Result<Option<i64>> {
        Ok(self
            .get_value(key, SettingKind::Integer, protection)?
            .and_then(|v| v.as_integer()))
    }

    /// Reads an integer or returns `default`.
    fn get_int_or(&self, key: &str, default: i64, protection: ProtectionLevel) -> Result<i64> {
        Ok(self.get_int(key, protection)?.unwrap_or(default))
    }

    /// Reads a boolean or returns `default`.
    fn get_bool_or(&self, key: &str, default: bool, protection: ProtectionLevel) -> Result<bool> {
        Ok(self
            .get_value(key, SettingKind::Boolean, protection)?
            .and_then(|v| v.as_bool())
            .unwrap_or(default))
    }

    /// Reads an enumeration stored by variant name.
    fn get_enum<T>(&self, key: &str, protection: ProtectionLevel) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let Some(value) = self.get_value(key, SettingKind::Enum, protection)? else {
            return Ok(None);
        };
        let name = value.encode();
        name.parse::<T>().map(Some).map_err(|e| {
            let shown = if protection.is_protected() {
                None
            } else {
                Some(name.as_str())
            };
            ConfigError::conversion(
                key,
                std::any::type_name::<T>(),
                shown,
                Some(e.to_string().into()),
            )
        })
    }

    /// Reads an enumeration or returns `default`.
    fn get_enum_or<T>(&self, key: &str, default: T, protection: ProtectionLevel) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        Ok(self.get_enum(key, protection)?.unwrap_or(default))
    }

    /// Reads base64-encoded bytes.
    fn get_bytes(&self, key: &str, protection: ProtectionLevel) -> Result<Option<Vec<u8>>> {
        Ok(match self.get_value(key, SettingKind::Bytes, protection)? {
            Some(SettingValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        })
    }

    /// Reads a JSON-encoded object.
    fn get_object<T: DeserializeOwned>(
        &self,
        key: &str,
        protection: ProtectionLevel,
    ) -> Result<Option<T>> {
        match self.get_value(key, SettingKind::Object, protection)? {
            Some(value) => value.to_object(key).map(Some),
            None => Ok(None),
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

/// Typed writes for any [`WritableKeyValueStore`].
pub trait WritableKeyValueStoreExt: WritableKeyValueStore {
    /// Encodes and writes a value; `None` deletes the key.
    fn set_value(
        &self,
        key: &str,
        value: Option<&SettingValue>,
        protection: ProtectionLevel,
    ) -> Result<()> {
        let encoded = value.map(SettingValue::encode);
        self.set(key, encoded.as_deref(), protection)
    }

    /// Writes text; `None` or blank deletes the key.
    fn set_string(&self, key: &str, value: Option<&str>, protection: ProtectionLevel) -> Result<()> {
        self.set(key, value, protection)
    }

    /// Writes an integer.
    fn set_int(&self, key: &str, value: i64, protection: ProtectionLevel) -> Result<()> {
        self.set_value(key, Some(&SettingValue::Integer(value)), protection)
    }

    /// Writes a boolean as lowercase text.
    fn set_bool(&self, key: &str, value: bool, protection: ProtectionLevel) -> Result<()> {
        self.set_value(key, Some(&SettingValue::Boolean(value)), protection)
    }

    /// Writes an enumeration by variant name.
    fn set_enum<T: fmt::Display>(&self, key: &str, value: T, protection: ProtectionLevel) -> Result<()> {
        self.set_value(key, Some(&SettingValue::enumeration(value)), protection)
    }

    /// Writes bytes as base64.
    fn set_bytes(&self, key: &str, value: Option<&[u8]>, protection: ProtectionLevel) -> Result<()> {
        let value = value.map(|b| SettingValue::Bytes(b.to_vec()));
        self.set_value(key, value.as_ref(), protection)
    }

    /// Writes an object as JSON; `None` deletes the key.
    fn set_object<T: Serialize>(
        &self,
        key: &str,
        value: Option<&T>,
        protection: ProtectionLevel,
    ) -> Result<()> {
        let value = value.map(|v| SettingValue::object(key, v)).transpose()?;
        match value {
            Some(SettingValue::Object(serde_json::Value::Null)) | None => self.remove(key),
            Some(value) => self.set_value(key, Some(&value), protection),
        }
    }
}

impl<S: WritableKeyValueStore + ?Sized> WritableKeyValueStoreExt for S {}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed setting values and their text encoding.
//!
//! Stores hold raw text. [`SettingValue`] is the closed set of shapes a caller can
//! read or write through the typed helpers, each with one explicit encoding:
//!
//! | Variant   | Stored text                               |
//! |-----------|-------------------------------------------|
//! | `Text`    | as is                                     |
//! | `Integer` | decimal, invariant                        |
//! | `Boolean` | `true` / `false` (lowercase)              |
//! | `Enum`    | the variant name                          |
//! | `Bytes`   | standard base64                           |
//! | `Object`  | JSON                                      |

use crate::domain::errors::{ConfigError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Whether a value is encrypted at rest.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProtectionLevel {
    /// Stored as plain text.
    #[default]
    None,
    /// Encrypted with the machine key before it is written.
    MachineKey,
}

impl ProtectionLevel {
    /// Returns `true` for levels that encrypt.
    pub fn is_protected(self) -> bool {
        !matches!(self, ProtectionLevel::None)
    }
}

/// The decode target for a raw stored value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKind {
    /// Plain text.
    Text,
    /// A signed 64-bit integer.
    Integer,
    /// A boolean.
    Boolean,
    /// An enumeration variant stored by name.
    Enum,
    /// Binary data.
    Bytes,
    /// A structured object.
    Object,
}

impl SettingKind {
    /// Returns the type name used in conversion errors.
    pub fn type_name(self) -> &'static str {
        match self {
            SettingKind::Text => "string",
            SettingKind::Integer => "integer",
            SettingKind::Boolean => "boolean",
            SettingKind::Enum => "enum",
            SettingKind::Bytes => "byte array",
            SettingKind::Object => "object",
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A typed setting value.
///
/// # Examples
///
/// ```
/// use instancecfg::domain::{SettingKind, SettingValue};
///
/// let value = SettingValue::Boolean(true);
/// assert_eq!(value.encode(), "true");
///
/// let decoded = SettingValue::decode("Feature.Enabled", SettingKind::Boolean, "True", false).unwrap();
/// assert_eq!(decoded, SettingValue::Boolean(true));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    /// Plain text.
    Text(String),
    /// A signed 64-bit integer.
    Integer(i64),
    /// A boolean.
    Boolean(bool),
    /// An enumeration variant name.
    Enum(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// A structured object.
    Object(serde_json::Value),
}

impl SettingValue {
    /// Creates an `Enum` value from anything whose `Display` is the variant name.
    pub fn enumeration(variant: impl fmt::Display) -> Self {
        SettingValue::Enum(variant.to_string())
    }

    /// Creates an `Object` value by serializing `value`.
    pub fn object<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(SettingValue::Object)
            .map_err(|e| ConfigError::conversion(key, "object", None, Some(Box::new(e))))
    }

    /// Returns the kind of this value.
    pub fn kind(&self) -> SettingKind {
        match self {
            SettingValue::Text(_) => SettingKind::Text,
            SettingValue::Integer(_) => SettingKind::Integer,
            SettingValue::Boolean(_) => SettingKind::Boolean,
            SettingValue::Enum(_) => SettingKind::Enum,
            SettingValue::Bytes(_) => SettingKind::Bytes,
            SettingValue::Object(_) => SettingKind::Object,
        }
    }

    /// Encodes the value as the text written to a store.
    pub fn encode(&self) -> String {
        match self {
            SettingValue::Text(s) | SettingValue::Enum(s) => s.clone(),
            SettingValue::Integer(n) => n.to_string(),
            SettingValue::Boolean(true) => "true".to_string(),
            SettingValue::Boolean(false) => "false".to_string(),
            SettingValue::Bytes(bytes) => STANDARD.encode(bytes),
            SettingValue::Object(value) => value.to_string(),
        }
    }

    /// Decodes raw stored text as `kind`.
    ///
    /// When `protected` is set the raw text is left out of any conversion error.
    pub fn decode(key: &str, kind: SettingKind, raw: &str, protected: bool) -> Result<Self> {
        let shown = if protected { None } else { Some(raw) };
        let fail = |source: Option<Box<dyn std::error::Error + Send + Sync>>| {
            ConfigError::conversion(key, kind.type_name(), shown, source)
        };

        match kind {
            SettingKind::Text => Ok(SettingValue::Text(raw.to_string())),
            SettingKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(SettingValue::Integer)
                .map_err(|e| fail(Some(Box::new(e)))),
            SettingKind::Boolean => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Ok(SettingValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Ok(SettingValue::Boolean(false))
                } else {
                    Err(fail(trimmed
                        .parse::<bool>()
                        .err()
                        .map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)))
                }
            }
            SettingKind::Enum => {
                let name = raw.trim();
                if name.is_empty() {
                    Err(fail(None))
                } else {
                    Ok(SettingValue::Enum(name.to_string()))
                }
            }
            SettingKind::Bytes => STANDARD
                .decode(raw.trim())
                .map(SettingValue::Bytes)
                .map_err(|e| fail(Some(Box::new(e)))),
            SettingKind::Object => serde_json::from_str(raw)
                .map(SettingValue::Object)
                .map_err(|e| fail(Some(Box::new(e)))),
        }
    }

    /// Returns the text if this is a `Text` or `Enum` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SettingValue::Text(s) | SettingValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Integer` value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Boolean` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            SettingValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Deserializes an `Object` value into `T`.
    pub fn to_object<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        match self {
            SettingValue::Object(value) => serde_json::from_value(value.clone())
                .map_err(|e| ConfigError::conversion(key, "object", None, Some(Box::new(e)))),
            other => {
                let raw = other.encode();
                Err(ConfigError::conversion(key, "object", Some(raw.as_str()), None))
            }
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::Text(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::Text(s)
    }
}

impl From<i64> for SettingValue {
    fn from(n: i64) -> Self {
        SettingValue::Integer(n)
    }
}

impl From<i32> for SettingValue {
    fn from(n: i32) -> Self {
        SettingValue::Integer(i64::from(n))
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Boolean(b)
    }
}

impl From<Vec<u8>> for SettingValue {
    fn from(bytes: Vec<u8>) -> Self {
        SettingValue::Bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_booleans_encode_lowercase() {
        assert_eq!(SettingValue::Boolean(true).encode(), "true");
        assert_eq!(SettingValue::Boolean(false).encode(), "false");
    }

    #[test]
    fn test_boolean_decode_accepts_legacy_casing() {
        for raw in ["True", "TRUE", " true "] {
            let value = SettingValue::decode("k", SettingKind::Boolean, raw, false).unwrap();
            assert_eq!(value, SettingValue::Boolean(true));
        }
        let value = SettingValue::decode("k", SettingKind::Boolean, "False", false).unwrap();
        assert_eq!(value, SettingValue::Boolean(false));
    }

    #[test]
    fn test_boolean_decode_rejects_yes() {
        let err = SettingValue::decode("Feature.On", SettingKind::Boolean, "yes", false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to parse configuration key 'Feature.On' as a 'boolean'. Value was 'yes'."
        );
    }

    #[test]
    fn test_integer_decode() {
        let value = SettingValue::decode("Port", SettingKind::Integer, "10933", false).unwrap();
        assert_eq!(value.as_integer(), Some(10933));
        assert!(SettingValue::decode("Port", SettingKind::Integer, "ten", false).is_err());
    }

    #[test]
    fn test_protected_decode_error_hides_raw_text() {
        let err = SettingValue::decode("Api.Key", SettingKind::Integer, "secret", true).unwrap_err();
        assert!(!err.to_string().contains("secret"));
    }

    #[test]
    fn test_bytes_are_base64() {
        let value = SettingValue::Bytes(vec![0, 1, 2, 254, 255]);
        let encoded = value.encode();
        assert_eq!(encoded, "AAEC/v8=");
        let decoded = SettingValue::decode("b", SettingKind::Bytes, &encoded, false).unwrap();
        assert_eq!(decoded.as_bytes(), Some(&[0u8, 1, 2, 254, 255][..]));
    }

    #[test]
    fn test_enum_stored_by_name() {
        #[derive(Debug)]
        enum Mode {
            Listening,
        }
        impl fmt::Display for Mode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:?}", self)
            }
        }
        assert_eq!(SettingValue::enumeration(Mode::Listening).encode(), "Listening");
        assert!(SettingValue::decode("m", SettingKind::Enum, "  ", false).is_err());
    }

    #[test]
    fn test_object_encoding() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Proxy {
            host: String,
            port: u16,
        }
        let proxy = Proxy {
            host: "proxy.local".to_string(),
            port: 3128,
        };
        let value = SettingValue::object("Proxy", &proxy).unwrap();
        let raw = value.encode();
        let decoded = SettingValue::decode("Proxy", SettingKind::Object, &raw, false).unwrap();
        assert_eq!(decoded.to_object::<Proxy>("Proxy").unwrap(), proxy);
    }

    #[test]
    fn test_protection_level_default_is_none() {
        assert_eq!(ProtectionLevel::default(), ProtectionLevel::None);
        assert!(ProtectionLevel::MachineKey.is_protected());
        assert!(!ProtectionLevel::None.is_protected());
    }
}

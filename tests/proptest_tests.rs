// SPDX-License-Identifier: MIT OR Apache-2.0

//! Property-based tests using proptest.
//!
//! These tests use property-based testing to verify that keys, values and
//! `.env` parsing hold up for arbitrary inputs.

use instancecfg::adapters::{parse_env_file, AggregatedKeyValueStore, InMemoryKeyValueStore};
use instancecfg::domain::{ProtectionLevel, SettingKey, SettingKind, SettingValue};
use instancecfg::ports::{KeyValueStore, KeyValueStoreExt, WritableKeyValueStore};
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

// Test that keys differing only by ASCII case are the same setting
proptest! {
    #[test]
    fn test_setting_key_ignores_case(s in "[A-Za-z][A-Za-z0-9.]{0,30}") {
        let key = SettingKey::from(s.clone());
        prop_assert_eq!(&key, &SettingKey::from(s.to_uppercase()));
        prop_assert_eq!(&key, &SettingKey::from(s.to_lowercase()));
        prop_assert_eq!(key.as_str(), s.as_str());
    }
}

// Test that integers survive encode/decode
proptest! {
    #[test]
    fn test_integer_encoding(n in any::<i64>()) {
        let encoded = SettingValue::Integer(n).encode();
        let decoded = SettingValue::decode("k", SettingKind::Integer, &encoded, false).unwrap();
        prop_assert_eq!(decoded.as_integer(), Some(n));
    }
}

// Test that bytes survive encode/decode
proptest! {
    #[test]
    fn test_bytes_encoding(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let encoded = SettingValue::Bytes(bytes.clone()).encode();
        let decoded = SettingValue::decode("k", SettingKind::Bytes, &encoded, false).unwrap();
        prop_assert_eq!(decoded.as_bytes(), Some(bytes.as_slice()));
    }
}

// Test that non-numeric text never parses as an integer and fails gracefully
proptest! {
    #[test]
    fn test_non_numeric_integer_fails(s in "[a-zA-Z]\\PC*") {
        let result = SettingValue::decode("Agent.Port", SettingKind::Integer, &s, true);
        prop_assert!(result.is_err());
        let message = result.unwrap_err().to_string();
        prop_assert!(message.contains("Agent.Port"));
    }
}

// Test that the value is everything after the first `=`, trimmed
proptest! {
    #[test]
    fn test_env_value_after_first_delimiter(
        key in "[A-Z_][A-Z0-9_]{0,20}",
        value in "[^\r\n]{0,40}"
    ) {
        let parsed = parse_env_file(Path::new(".env"), &format!("{}={}", key, value)).unwrap();
        prop_assert_eq!(parsed.get(&key).map(String::as_str), Some(value.trim()));
    }
}

// Test that any line without `=` is rejected with its line number
proptest! {
    #[test]
    fn test_env_line_without_delimiter(
        blank_lines in 0usize..5,
        line in "[A-Za-z0-9_ ]{0,20}[A-Za-z0-9_]"
    ) {
        let content = format!("{}{}\n", "\n".repeat(blank_lines), line);
        let err = parse_env_file(Path::new(".env"), &content).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("Line {} is not formatted correctly", blank_lines + 1));
    }
}

// Test that the aggregate returns the first layer holding a key
proptest! {
    #[test]
    fn test_aggregate_first_present_wins(
        present in prop::collection::vec(prop::option::of(any::<i64>()), 1..6),
        default in any::<i64>()
    ) {
        let mut layers: Vec<Arc<dyn KeyValueStore>> = Vec::new();
        for value in &present {
            let store = InMemoryKeyValueStore::unprotected();
            if let Some(n) = value {
                store.set("k", Some(&n.to_string()), ProtectionLevel::None).unwrap();
            }
            layers.push(Arc::new(store));
        }
        let aggregate = AggregatedKeyValueStore::new(layers);

        let expected = present.iter().flatten().next().copied().unwrap_or(default);
        prop_assert_eq!(aggregate.get_int_or("k", default, ProtectionLevel::None).unwrap(), expected);
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for typed reads and writes across stores.

mod common;

use common::test_encryptor;
use instancecfg::adapters::{AggregatedKeyValueStore, FileKeyValueStore, InMemoryKeyValueStore};
use instancecfg::domain::ProtectionLevel;
use instancecfg::ports::{
    KeyValueStore, KeyValueStoreExt, WritableKeyValueStore, WritableKeyValueStoreExt,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommunicationStyle {
    Listening,
    Polling,
}

impl fmt::Display for CommunicationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommunicationStyle::Listening => f.write_str("Listening"),
            CommunicationStyle::Polling => f.write_str("Polling"),
        }
    }
}

impl FromStr for CommunicationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Listening" => Ok(CommunicationStyle::Listening),
            "Polling" => Ok(CommunicationStyle::Polling),
            other => Err(format!("unknown style {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Proxy {
    host: String,
    port: u16,
    bypass: Vec<String>,
    credentials: Option<Credentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Credentials {
    user: String,
}

fn layer(store: InMemoryKeyValueStore) -> Arc<dyn KeyValueStore> {
    Arc::new(store)
}

#[test]
fn test_aggregate_reads_past_absent_layer() {
    let first = InMemoryKeyValueStore::unprotected();
    let second = InMemoryKeyValueStore::unprotected();
    second.set("k", Some("a value"), ProtectionLevel::None).unwrap();

    let aggregate = AggregatedKeyValueStore::new(vec![layer(first), layer(second)]);
    assert_eq!(
        aggregate.get_string_or("k", "", ProtectionLevel::None).unwrap(),
        "a value"
    );
}

#[test]
fn test_aggregate_of_empty_store_uses_default() {
    let aggregate = AggregatedKeyValueStore::new(vec![layer(InMemoryKeyValueStore::unprotected())]);
    assert_eq!(aggregate.get_int_or("k", 80, ProtectionLevel::None).unwrap(), 80);
}

#[test]
fn test_aggregate_finds_integer_in_lower_layer() {
    let lower = InMemoryKeyValueStore::unprotected();
    lower.set_int("k", 50, ProtectionLevel::None).unwrap();

    let aggregate = AggregatedKeyValueStore::new(vec![
        layer(InMemoryKeyValueStore::unprotected()),
        layer(lower),
    ]);
    assert_eq!(aggregate.get_int_or("k", 80, ProtectionLevel::None).unwrap(), 50);
}

#[test]
fn test_zero_and_false_are_not_defaults() {
    let upper = InMemoryKeyValueStore::unprotected();
    upper.set_int("Agent.Port", 0, ProtectionLevel::None).unwrap();
    upper.set_bool("Agent.Enabled", false, ProtectionLevel::None).unwrap();
    let lower = InMemoryKeyValueStore::unprotected();
    lower.set_int("Agent.Port", 10933, ProtectionLevel::None).unwrap();
    lower.set_bool("Agent.Enabled", true, ProtectionLevel::None).unwrap();

    let aggregate = AggregatedKeyValueStore::new(vec![layer(upper), layer(lower)]);
    assert_eq!(aggregate.get_int_or("Agent.Port", 80, ProtectionLevel::None).unwrap(), 0);
    assert!(!aggregate.get_bool_or("Agent.Enabled", true, ProtectionLevel::None).unwrap());
}

fn reopen(dir: &TempDir, file: &str) -> FileKeyValueStore {
    FileKeyValueStore::open(dir.path().join(file), test_encryptor())
}

fn round_trip_every_kind(file: &str) {
    for protection in [ProtectionLevel::None, ProtectionLevel::MachineKey] {
        let dir = TempDir::new().unwrap();
        let proxy = Proxy {
            host: "proxy.local".to_string(),
            port: 3128,
            bypass: vec!["localhost".to_string(), "*.internal".to_string()],
            credentials: Some(Credentials {
                user: "svc<agent>&\"ops\"".to_string(),
            }),
        };

        {
            let store = reopen(&dir, file);
            store.set_bool("Agent.Enabled", true, protection).unwrap();
            store.set_bool("Agent.Paused", false, protection).unwrap();
            store.set_int("Agent.Port", -10933, protection).unwrap();
            store.set_string("Agent.Name", Some("Web Server 01"), protection).unwrap();
            store.set_enum("Agent.Style", CommunicationStyle::Polling, protection).unwrap();
            store.set_bytes("Agent.Thumbprint", Some(&[0u8, 1, 2, 254, 255][..]), protection).unwrap();
            store.set_object("Agent.Proxy", Some(&proxy), protection).unwrap();
            store.set_object::<Option<Proxy>>("Agent.NoProxy", Some(&None), protection).unwrap();
            store.set_string("Agent.Blank", Some(""), protection).unwrap();
            store.set_string("Agent.Missing", None, protection).unwrap();
            store.save().unwrap();
        }

        let store = reopen(&dir, file);
        assert!(store.get_bool_or("Agent.Enabled", false, protection).unwrap());
        assert!(!store.get_bool_or("Agent.Paused", true, protection).unwrap());
        assert_eq!(store.get_int("Agent.Port", protection).unwrap(), Some(-10933));
        assert_eq!(
            store.get_string_or("Agent.Name", "", protection).unwrap(),
            "Web Server 01"
        );
        assert_eq!(
            store
                .get_enum::<CommunicationStyle>("Agent.Style", protection)
                .unwrap(),
            Some(CommunicationStyle::Polling)
        );
        assert_eq!(
            store
                .get_enum_or("Agent.Unset", CommunicationStyle::Listening, protection)
                .unwrap(),
            CommunicationStyle::Listening
        );
        assert_eq!(
            store.get_bytes("Agent.Thumbprint", protection).unwrap(),
            Some(vec![0, 1, 2, 254, 255])
        );
        assert_eq!(
            store.get_object::<Proxy>("Agent.Proxy", protection).unwrap(),
            Some(proxy)
        );
        assert_eq!(store.get_object::<Proxy>("Agent.NoProxy", protection).unwrap(), None);
        assert_eq!(store.get("Agent.Blank", protection).unwrap(), None);
        assert_eq!(store.get("Agent.Missing", protection).unwrap(), None);
    }
}

#[test]
fn test_round_trip_xml_document() {
    round_trip_every_kind("agent.config");
}

#[test]
fn test_round_trip_json_document() {
    round_trip_every_kind("agent.json");
}

#[cfg(feature = "yaml")]
#[test]
fn test_round_trip_yaml_document() {
    round_trip_every_kind("agent.yaml");
}

#[test]
fn test_protected_value_is_not_stored_in_clear() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("agent.config");
    let store = FileKeyValueStore::open(&path, test_encryptor());
    store
        .set("Agent.ApiKey", Some("API-SECRET-1234"), ProtectionLevel::MachineKey)
        .unwrap();
    store.save().unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("API-SECRET-1234"));

    let reopened = FileKeyValueStore::open(&path, test_encryptor());
    assert_eq!(
        reopened.get("Agent.ApiKey", ProtectionLevel::MachineKey).unwrap().as_deref(),
        Some("API-SECRET-1234")
    );
}

#[test]
fn test_keys_are_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let store = reopen(&dir, "agent.config");
    store.set_int("Agent.Port", 1, ProtectionLevel::None).unwrap();
    store.set_int("AGENT.PORT", 2, ProtectionLevel::None).unwrap();
    store.save().unwrap();

    let store = reopen(&dir, "agent.config");
    assert_eq!(store.keys().unwrap().len(), 1);
    assert_eq!(store.get_int("agent.port", ProtectionLevel::None).unwrap(), Some(2));
}

#[test]
fn test_conversion_error_names_key_and_value() {
    let store = InMemoryKeyValueStore::unprotected();
    store.set("Agent.Port", Some("ten"), ProtectionLevel::None).unwrap();
    let err = store.get_int("Agent.Port", ProtectionLevel::None).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Agent.Port"));
    assert!(message.contains("ten"));
}

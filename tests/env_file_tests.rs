// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for `.env` parsing and discovery.

mod common;

use common::{app, mapping, write_file};
use instancecfg::adapters::{load_env_file, parse_env_file, EnvFileLocator, EnvironmentKeyValueStore};
use instancecfg::adapters::strategies::EnvFileStrategy;
use instancecfg::domain::{ConfigError, ProtectionLevel};
use instancecfg::ports::{ApplicationInstanceStrategy, KeyValueStore, MapEnvironment};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_blank_and_comment_lines_are_ignored() {
    let content = "\n# a comment\n   \n  # indented comment\nAGENT_SERVER_URL=https://octo.local\n\n";
    let values = parse_env_file(Path::new(".env"), content).unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values["AGENT_SERVER_URL"], "https://octo.local");
}

#[test]
fn test_line_without_delimiter_names_line_number() {
    let content = "# header\nAGENT_PORT=10933\nTHIS LINE IS BROKEN\n";
    let err = parse_env_file(Path::new("/srv/.env"), content).unwrap_err();
    match &err {
        ConfigError::EnvFileFormat { line, path } => {
            assert_eq!(*line, 3);
            assert_eq!(path, Path::new("/srv/.env"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_controlled());
    assert_eq!(err.to_string(), "Line 3 is not formatted correctly");
}

#[test]
fn test_value_keeps_everything_after_first_delimiter() {
    let values = parse_env_file(Path::new(".env"), "Foo=Bar==").unwrap();
    assert_eq!(values["Foo"], "Bar==");

    let values = parse_env_file(Path::new(".env"), "  Token = a=b=c  ").unwrap();
    assert_eq!(values["Token"], "a=b=c");
}

#[test]
fn test_empty_value_is_kept() {
    let values = parse_env_file(Path::new(".env"), "AGENT_PORT=").unwrap();
    assert_eq!(values["AGENT_PORT"], "");
}

#[test]
fn test_later_duplicate_wins() {
    let values = parse_env_file(Path::new(".env"), "AGENT_PORT=1\nAGENT_PORT=2\n").unwrap();
    assert_eq!(values["AGENT_PORT"], "2");
}

#[test]
fn test_locator_walks_up_from_start() {
    let dir = TempDir::new().unwrap();
    let env = write_file(&dir.path().join(".env"), "AGENT_SERVER_URL=https://octo.local\n");
    let nested = dir.path().join("bin").join("release");
    std::fs::create_dir_all(&nested).unwrap();

    let located = EnvFileLocator::new(&nested).locate().unwrap();
    assert_eq!(located, env);
    assert_eq!(load_env_file(&located).unwrap().len(), 1);
}

#[test]
fn test_locator_prefers_nearest_file() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join(".env"), "AGENT_PORT=1\n");
    let near = write_file(&dir.path().join("app").join(".env"), "AGENT_PORT=2\n");

    let located = EnvFileLocator::new(dir.path().join("app")).locate().unwrap();
    assert_eq!(located, near);
}

#[test]
fn test_env_file_store_maps_variables_to_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir.path().join(".env"),
        "AGENT_SERVER_URL=https://octo.local\nAGENT_API_KEY=API-123\nUNRELATED=1\n",
    );

    let store = EnvironmentKeyValueStore::from_env_file(&path, mapping()).unwrap();
    assert_eq!(
        store.get("Agent.ServerUrl", ProtectionLevel::None).unwrap().as_deref(),
        Some("https://octo.local")
    );
    assert_eq!(
        store.get("agent.apikey", ProtectionLevel::MachineKey).unwrap().as_deref(),
        Some("API-123")
    );
    assert_eq!(store.get("UNRELATED", ProtectionLevel::None).unwrap(), None);
    assert!(store.missing_required().is_empty());
}

#[test]
fn test_env_file_saved_with_byte_order_mark_yields_instance() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join(".env"), "\u{feff}AGENT_SERVER_URL=https://octo.local\n");

    let strategy = EnvFileStrategy::new(
        EnvFileLocator::new(dir.path()),
        mapping(),
        Arc::new(MapEnvironment::new()),
    );
    assert!(strategy.any_instances_configured(&app()).unwrap());
    assert_eq!(strategy.list_instances(&app()).unwrap().len(), 1);
}

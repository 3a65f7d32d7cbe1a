// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for machine key fallback.

mod common;

use common::{material, CountingKeySource};
use instancecfg::adapters::crypto::{FallbackMachineKeyEncryptor, KeyFileSource};
use instancecfg::domain::ConfigError;
use instancecfg::ports::{KeySource, MachineKeyEncryptor};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_first_working_source_wins_and_later_sources_are_untouched() {
    let bad = CountingKeySource::failing("bad");
    let good = CountingKeySource::working("good", material(3));
    let after = CountingKeySource::failing("after");

    let sources: Vec<Arc<dyn KeySource>> = vec![
        bad.clone() as Arc<dyn KeySource>,
        good.clone() as Arc<dyn KeySource>,
        after.clone() as Arc<dyn KeySource>,
    ];
    let encryptor = FallbackMachineKeyEncryptor::new(sources);

    let sealed = encryptor.encrypt("connection-string").unwrap();
    assert_eq!(bad.calls(), 1);
    assert_eq!(good.calls(), 1);
    assert_eq!(after.calls(), 0);

    assert_eq!(encryptor.decrypt(&sealed).unwrap(), "connection-string");
    assert_eq!(after.calls(), 0);
}

#[test]
fn test_all_sources_failing_reports_each_failure() {
    let sources: Vec<Arc<dyn KeySource>> = vec![
        CountingKeySource::failing("first") as Arc<dyn KeySource>,
        CountingKeySource::failing("second") as Arc<dyn KeySource>,
    ];
    let encryptor = FallbackMachineKeyEncryptor::new(sources);

    match encryptor.encrypt("x").unwrap_err() {
        ConfigError::AllKeySourcesFailed { errors } => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_rotated_key_still_decrypts_through_older_source() {
    let old = CountingKeySource::working("old", material(1));
    let sealed = FallbackMachineKeyEncryptor::new(vec![old.clone() as Arc<dyn KeySource>])
        .encrypt("secret")
        .unwrap();

    let new = CountingKeySource::working("new", material(2));
    let sources: Vec<Arc<dyn KeySource>> = vec![new.clone() as Arc<dyn KeySource>, old as Arc<dyn KeySource>];
    let rotated = FallbackMachineKeyEncryptor::new(sources);
    assert_eq!(rotated.decrypt(&sealed).unwrap(), "secret");
    assert_eq!(new.calls(), 1);
}

#[test]
fn test_key_file_is_generated_once_and_reused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("machinekey");

    let first = KeyFileSource::new(&path).load().unwrap();
    assert!(path.is_file());
    let second = KeyFileSource::new(&path).load().unwrap();
    assert_eq!(first.key, second.key);
    assert_eq!(first.iv, second.iv);
}

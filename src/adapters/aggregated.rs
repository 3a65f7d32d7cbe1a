// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only layering of several stores.

use crate::domain::{ProtectionLevel, Result, SettingKey};
use crate::ports::KeyValueStore;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// A read-only view over an ordered list of stores, first = highest priority.
///
/// A lookup returns the first raw value any layer holds, including an
/// explicitly stored empty string. Only when every layer reports the key as
/// absent does the lookup report it absent, so the caller's default is never
/// chosen over a stored `0` or `false` further down.
///
/// Writes are not routed: obtain the specific writable store and write to it.
///
/// # Examples
///
/// ```rust
/// use instancecfg::adapters::{AggregatedKeyValueStore, InMemoryKeyValueStore};
/// use instancecfg::domain::ProtectionLevel;
/// use instancecfg::ports::{KeyValueStore, KeyValueStoreExt, WritableKeyValueStore};
/// use std::sync::Arc;
///
/// # fn main() -> instancecfg::domain::Result<()> {
/// let bottom = InMemoryKeyValueStore::unprotected();
/// bottom.set("Server.Port", Some("50"), ProtectionLevel::None)?;
///
/// let top: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::unprotected());
/// let bottom: Arc<dyn KeyValueStore> = Arc::new(bottom);
/// let aggregate = AggregatedKeyValueStore::new(vec![top, bottom]);
/// assert_eq!(aggregate.get_int_or("Server.Port", 80, ProtectionLevel::None)?, 50);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AggregatedKeyValueStore {
    layers: Vec<Arc<dyn KeyValueStore>>,
}

impl AggregatedKeyValueStore {
    /// Creates an aggregate; `layers[0]` wins.
    pub fn new(layers: Vec<Arc<dyn KeyValueStore>>) -> Self {
        Self { layers }
    }

    /// Returns the layers, highest priority first.
    pub fn layers(&self) -> &[Arc<dyn KeyValueStore>] {
        &self.layers
    }
}

impl fmt::Debug for AggregatedKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.layers.iter().map(|layer| layer.name()))
            .finish()
    }
}

impl KeyValueStore for AggregatedKeyValueStore {
    fn name(&self) -> &str {
        "aggregate"
    }

    fn get(&self, key: &str, protection: ProtectionLevel) -> Result<Option<String>> {
        for layer in &self.layers {
            if let Some(raw) = layer.get(key, protection)? {
                return Ok(Some(raw));
            }
        }
        Ok(None)
    }

    fn keys(&self) -> Result<Vec<SettingKey>> {
        let mut keys = BTreeSet::new();
        for layer in &self.layers {
            keys.extend(layer.keys()?);
        }
        Ok(keys.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKeyValueStore;
    use crate::ports::{KeyValueStoreExt, WritableKeyValueStore};

    fn store(values: &[(&str, &str)]) -> Arc<dyn KeyValueStore> {
        let store = InMemoryKeyValueStore::unprotected();
        for (k, v) in values {
            store.set(k, Some(v), ProtectionLevel::None).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_falls_through_absent_layers() {
        let aggregate = AggregatedKeyValueStore::new(vec![store(&[]), store(&[("k", "a value")])]);
        assert_eq!(
            aggregate.get_string_or("k", "", ProtectionLevel::None).unwrap(),
            "a value"
        );
    }

    #[test]
    fn test_first_layer_wins() {
        let aggregate =
            AggregatedKeyValueStore::new(vec![store(&[("k", "top")]), store(&[("k", "bottom")])]);
        assert_eq!(aggregate.get("K", ProtectionLevel::None).unwrap().as_deref(), Some("top"));
    }

    #[test]
    fn test_zero_does_not_fall_through_to_default() {
        let aggregate = AggregatedKeyValueStore::new(vec![store(&[("k", "0")]), store(&[("k", "7")])]);
        assert_eq!(aggregate.get_int_or("k", 80, ProtectionLevel::None).unwrap(), 0);
    }

    #[test]
    fn test_default_only_when_every_layer_is_absent() {
        let aggregate = AggregatedKeyValueStore::new(vec![store(&[])]);
        assert_eq!(aggregate.get_int_or("k", 80, ProtectionLevel::None).unwrap(), 80);
    }

    #[test]
    fn test_keys_are_merged() {
        let aggregate =
            AggregatedKeyValueStore::new(vec![store(&[("a", "1"), ("B", "2")]), store(&[("b", "3")])]);
        assert_eq!(aggregate.keys().unwrap().len(), 2);
    }
}

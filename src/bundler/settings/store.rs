//! Ordered key/value settings with last-write-wins merging.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single setting value. Settings are arbitrarily typed.
pub type SettingValue = serde_json::Value;

/// Project-wide settings consulted by packaging and component builds.
///
/// Holds exactly the last written value per key. A bulk [`merge`](Self::merge)
/// counts as one write per incoming key, so anything assigned before a merge
/// is overridden by it and anything assigned after it wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsStore {
    values: BTreeMap<String, SettingValue>,
}

impl SettingsStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a single key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<SettingValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the current value of `key`.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    /// Returns the value of `key` when it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(SettingValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Overwrites every key present in `incoming`; keys only present locally
    /// are left alone.
    pub fn merge<I, K>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = (K, SettingValue)>,
        K: Into<String>,
    {
        for (key, value) in incoming {
            self.values.insert(key.into(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates settings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &SettingValue)> {
        self.values.iter()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &BTreeMap<String, SettingValue> {
        &self.values
    }
}

impl From<BTreeMap<String, SettingValue>> for SettingsStore {
    fn from(values: BTreeMap<String, SettingValue>) -> Self {
        Self { values }
    }
}

impl IntoIterator for SettingsStore {
    type Item = (String, SettingValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, SettingValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, SettingValue)> for SettingsStore {
    fn from_iter<T: IntoIterator<Item = (K, SettingValue)>>(iter: T) -> Self {
        let mut store = Self::new();
        store.merge(iter);
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_conflicts_and_keeps_the_rest() {
        let mut store: SettingsStore = [("a", json!(0)), ("c", json!(3))].into_iter().collect();
        store.merge([("a", json!(1)), ("b", json!(2))]);

        assert_eq!(store.get("a"), Some(&json!(1)));
        assert_eq!(store.get("b"), Some(&json!(2)));
        assert_eq!(store.get("c"), Some(&json!(3)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn assignment_after_merge_wins() {
        let mut store = SettingsStore::new();
        store.merge([("k", json!("merged"))]);
        store.set("k", "local");
        assert_eq!(store.get_str("k"), Some("local"));
    }

    #[test]
    fn merge_after_assignment_wins() {
        let mut store = SettingsStore::new();
        store.set("k", "local");
        store.merge([("k", json!("merged"))]);
        assert_eq!(store.get_str("k"), Some("merged"));
    }

    #[test]
    fn non_string_values_survive() {
        let mut store = SettingsStore::new();
        store.set("jobs", 4);
        store.set("flags", json!(["-O2", "-g"]));
        assert_eq!(store.get("jobs"), Some(&json!(4)));
        assert_eq!(store.get_str("jobs"), None);
        assert!(store.get("flags").is_some_and(|v| v.is_array()));
    }
}

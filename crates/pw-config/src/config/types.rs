//! Configuration types

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Key under which the resolved project home is stored
pub const PROJ_HOME_KEY: &str = "PROJ_HOME";

/// Key naming the service, used as the env prefix when no app name is given
pub const SERVICE_KEY: &str = "SERVICE";

/// Returns true when `key` may be stored in a [`ConfigMap`].
///
/// A key qualifies when it has at least one cased character and no
/// lowercase characters, so `FOO_1` passes while `Foo`, `_` and `123` don't.
pub fn is_config_key(key: &str) -> bool {
    let mut cased = false;
    for c in key.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Flat, uppercase-keyed configuration map.
///
/// Values are arbitrary JSON values so nested lists and tables from config
/// files survive verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfigMap(BTreeMap<String, Value>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning false (and storing nothing) when the key is
    /// not uppercase.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let key = key.into();
        if !is_config_key(&key) {
            return false;
        }
        self.0.insert(key, value.into());
        true
    }

    /// Overlay `other` onto this map; `other` wins for duplicate keys.
    pub fn merge(&mut self, other: ConfigMap) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// The resolved project home, if this map came from `load_config`
    pub fn proj_home(&self) -> Option<PathBuf> {
        self.get_str(PROJ_HOME_KEY).map(PathBuf::from)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Collects only the uppercase keys; everything else is filtered out.
impl<K: Into<String>> FromIterator<(K, Value)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = ConfigMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_config_key() {
        assert!(is_config_key("FOO"));
        assert!(is_config_key("FOO_BAR_2"));
        assert!(is_config_key("_PRIVATE"));
        assert!(!is_config_key("Foo"));
        assert!(!is_config_key("foo"));
        assert!(!is_config_key("_"));
        assert!(!is_config_key("123"));
        assert!(!is_config_key(""));
    }

    #[test]
    fn test_insert_rejects_lowercase() {
        let mut config = ConfigMap::new();
        assert!(config.insert("LOGGING_LEVEL", "DEBUG"));
        assert!(!config.insert("logging_level", "INFO"));
        assert_eq!(config.len(), 1);
        assert_eq!(config.get_str("LOGGING_LEVEL"), Some("DEBUG"));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut base: ConfigMap = [("FOO", json!(1)), ("BAR", json!("base"))]
            .into_iter()
            .collect();
        let local: ConfigMap = [("BAR", json!("local")), ("BAZ", json!([1, 2]))]
            .into_iter()
            .collect();

        base.merge(local);
        assert_eq!(base.get("FOO"), Some(&json!(1)));
        assert_eq!(base.get_str("BAR"), Some("local"));
        assert_eq!(base.get("BAZ"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_typed_accessors() {
        let config: ConfigMap = [
            ("LOG_STDOUT", json!(true)),
            ("POOL", json!(10)),
            ("PROJ_HOME", json!("/srv/app")),
        ]
        .into_iter()
        .collect();

        assert_eq!(config.get_bool("LOG_STDOUT"), Some(true));
        assert_eq!(config.get_u64("POOL"), Some(10));
        assert_eq!(config.proj_home(), Some(PathBuf::from("/srv/app")));
        assert_eq!(config.get_u64("LOG_STDOUT"), None);
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let config: ConfigMap = [("FOO", json!({"bar": ["baz", 1]}))].into_iter().collect();
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value, json!({"FOO": {"bar": ["baz", 1]}}));
    }
}

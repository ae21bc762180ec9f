//! Environment variable overrides
//!
//! For every key already present in a [`ConfigMap`], two variables are
//! consulted in priority order:
//!
//! 1. `<APP>_<KEY>` where `<APP>` is the app name with `.` replaced by `_`
//!    and uppercased
//! 2. `<KEY>`
//!
//! Raw values are coerced in three tiers, always in this order: strict JSON,
//! then source-literal evaluation (see [`super::literal`]), then the raw
//! string unchanged.

use super::literal::parse_literal;
use super::types::ConfigMap;
use serde_json::Value;
use tracing::info;

/// Normalize an app name into an environment variable prefix
pub fn normalize_app_name(app_name: &str) -> String {
    app_name.replace('.', "_").to_uppercase()
}

/// Overlay process environment variables onto `config`.
pub fn update_from_env(app_name: &str, config: &mut ConfigMap) {
    update_from_source(app_name, config, |name| std::env::var(name).ok());
}

/// Overlay values from `lookup` onto `config`.
///
/// `lookup` receives a variable name and returns its value when set. This is
/// the seam tests use instead of mutating the process environment.
pub fn update_from_source<F>(app_name: &str, config: &mut ConfigMap, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let prefix = normalize_app_name(app_name);
    let keys: Vec<String> = config.keys().cloned().collect();

    for key in keys {
        let specific_app_key = format!("{prefix}_{key}");
        // Highest priority: variables with the app name as prefix
        let raw = lookup(&specific_app_key).or_else(|| lookup(&key));
        if let Some(raw) = raw {
            replace_value(config, &key, &raw);
        }
    }
}

fn replace_value(config: &mut ConfigMap, key: &str, raw: &str) {
    let old = config.get(key).cloned().unwrap_or(Value::Null);
    info!(
        key,
        old_value = %old,
        new_value = raw,
        "Overwriting constant '{key}' old value '{old}' with new value '{raw}' from environment"
    );
    config.insert(key, coerce_env_value(raw));
}

/// Coerce a raw environment string into a config value.
///
/// `"2"` becomes the integer 2 (JSON), `"True"` becomes `true` (literal
/// tier, since JSON only knows lowercase booleans) and anything neither
/// grammar accepts stays a string.
pub fn coerce_env_value(raw: &str) -> Value {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }
    if let Ok(value) = parse_literal(raw) {
        return value;
    }
    Value::String(raw.to_string())
}

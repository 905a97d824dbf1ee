//! Sensitive-attribute redaction of request payloads.

use std::collections::HashSet;

use serde_json::Value;

/// Replacement for sensitive values.
const MASK: &str = "***";

/// The default set of attribute names whose values are masked.
pub fn default_sensitive_attributes() -> HashSet<String> {
    [
        "password",
        "old_password",
        "new_password",
        "ldap_password",
        "ldap_search_passwd",
        "oidc_client_secret",
        "uaa_client_secret",
        "email_password",
        "secret",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Redact a JSON payload: every value whose key is in the sensitive set,
/// at any nesting depth, is replaced by `"***"`. Non-JSON input yields an
/// empty string.
pub fn redact(payload: &str, sensitive: &HashSet<String>) -> String {
    match serde_json::from_str::<Value>(payload) {
        Ok(mut value) => {
            redact_value(&mut value, sensitive);
            serde_json::to_string_pretty(&value).unwrap_or_default()
        }
        Err(_) => String::new(),
    }
}

fn redact_value(value: &mut Value, sensitive: &HashSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, item) in map.iter_mut() {
                if sensitive.contains(key) {
                    *item = Value::String(MASK.to_string());
                } else {
                    redact_value(item, sensitive);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_value(item, sensitive);
            }
        }
        _ => {}
    }
}

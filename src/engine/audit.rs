//! Step-input redaction for audit records
//!
//! Every attempted step is recorded with a copy of its input safe to log
//! or ship to support tooling: values under credential-looking keys are
//! replaced with `[REDACTED]`, recursively, arrays included.

use serde_json::Value;

/// Key substrings whose values are never surfaced in audit records
const SENSITIVE_KEYS: &[&str] = &["token", "password", "secret", "apikey", "api_key", "credential"];

/// Placeholder written over redacted values
pub const REDACTED: &str = "[REDACTED]";

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    SENSITIVE_KEYS.iter().any(|s| lower.contains(s))
}

/// Deep-copy a step input with sensitive values redacted
pub fn redact_input(input: &Value) -> Value {
    match input {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, value) in map {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(REDACTED.to_string()));
                } else {
                    out.insert(key.clone(), redact_input(value));
                }
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_input).collect()),
        other => other.clone(),
    }
}

//! Session identifier resolution.
//!
//! Derives a stable session id from whatever the calling harness supplies,
//! so that a multi-turn red-team conversation maps to the same durable
//! session even when every turn runs in a fresh process. Pure: identical
//! input always yields the same id, except for the final
//! randomly-generated fallback when no stable signal exists at all.

use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use leakscope_types::records::RequestContext;

/// Resolve a stable session id for a turn.
///
/// Priority order, first non-blank match wins:
/// 1. `vars.session_id` (alias `sessionId`)
/// 2. `test.provider.targetConversationId`
/// 3. `test.provider.redTeamingChatConversationId`
/// 4. `test.id`
/// 5. deterministic hash of the whole test object
/// 6. random UUID (breaks continuity; last resort)
///
/// Whitespace-only values at any level are treated as absent.
pub fn resolve_session_id(context: &RequestContext) -> String {
    if let Some(id) = non_blank(context.vars.session_id.as_deref()) {
        return id.to_string();
    }

    if let Some(test) = &context.test {
        for path in [
            &["provider", "targetConversationId"][..],
            &["provider", "redTeamingChatConversationId"][..],
            &["id"][..],
        ] {
            if let Some(id) = str_at(test, path) {
                return id.to_string();
            }
        }

        if has_content(test) {
            return content_hash(test);
        }
    }

    Uuid::new_v4().to_string()
}

/// Fixed-length hex digest of a JSON value, stable across processes.
///
/// Object keys are sorted recursively before hashing so that two
/// serializations of the same logical object always collide.
pub fn content_hash(value: &Value) -> String {
    let payload = canonicalize(value).to_string();
    let digest = Sha256::digest(payload.as_bytes());
    hex::encode(&digest[..8])
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// String value at a key path, trimmed, or None if absent/blank/non-string.
fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    non_blank(current.as_str())
}

/// Whether a test object carries anything worth hashing.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Recursively sort object keys so serialization order is canonical.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            let sorted = entries
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

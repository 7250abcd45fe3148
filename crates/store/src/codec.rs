//! Whitelist document codec.
//!
//! Two list shapes exist in the wild:
//!   - `[{"id": 123}, {"id": 456}]` (what we write)
//!   - `[123, 456]`                 (hand-edited files)
//!
//! Both are normalized into [`Membership`] here, before any invariant is
//! enforced. Unrecognized entries are skipped; a document whose top level is
//! not a JSON object is rejected.

use crate::membership::{IdentitySet, Membership};
use serde_json::{Map, Value};
use warden_core::error::{WardenError, WardenResult};
use warden_core::{Identity, Snapshot};

const ADMINS: &str = "admins";
const USERS: &str = "users";
const ALLOW_UNKNOWN: &str = "allow_unknown";

/// Parses a whitelist document.
///
/// `origin` only feeds error messages and log fields.
pub fn decode(text: &str, origin: &str) -> WardenResult<Membership> {
    let root: Value = serde_json::from_str(text)
        .map_err(|e| WardenError::ConfigCorrupt(format!("{origin}: {e}")))?;

    let root = match root {
        Value::Object(map) => map,
        other => {
            return Err(WardenError::ConfigCorrupt(format!(
                "{origin}: top level must be a JSON object, got {}",
                kind_of(&other)
            )));
        }
    };

    let admins = extract_ids(&root, ADMINS, origin);
    let users = extract_ids(&root, USERS, origin);
    let allow_unknown = match root.get(ALLOW_UNKNOWN) {
        Some(Value::Bool(flag)) => *flag,
        None => false,
        Some(other) => {
            tracing::warn!(
                origin,
                found = kind_of(other),
                "allow_unknown is not a boolean, defaulting to false"
            );
            false
        }
    };

    Ok(Membership {
        admins,
        users,
        allow_unknown,
    })
}

/// Serializes a snapshot as the canonical pretty-printed document.
pub fn encode(snapshot: &Snapshot) -> WardenResult<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|e| WardenError::Persist(format!("cannot serialize whitelist: {e}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

fn extract_ids(root: &Map<String, Value>, field: &str, origin: &str) -> IdentitySet {
    let items = match root.get(field) {
        None | Some(Value::Null) => return IdentitySet::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            tracing::warn!(
                origin,
                field,
                found = kind_of(other),
                "list field is not an array, treating as empty"
            );
            return IdentitySet::new();
        }
    };

    let mut skipped = 0usize;
    let ids: IdentitySet = items
        .iter()
        .filter_map(|item| {
            let id = entry_id(item);
            if id.is_none() {
                skipped += 1;
            }
            id
        })
        .collect();

    if skipped > 0 {
        tracing::debug!(origin, field, skipped, "ignored unrecognized list entries");
    }
    ids
}

/// Accepts a bare integer or an object carrying an integer `id`.
fn entry_id(item: &Value) -> Option<Identity> {
    match item {
        Value::Number(n) => n.as_i64().map(Identity),
        Value::Object(obj) => obj.get("id").and_then(Value::as_i64).map(Identity),
        _ => None,
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Structural checks for raw role payloads.
//!
//! Both predicates are total over [`serde_json::Value`]: every input has a
//! defined answer and nothing here can fail or panic. Only the top-level
//! array and the two required fields of each element are inspected.

use serde_json::Value;

use crate::role::{ROLE_ID_FIELD, ROLE_NAME_FIELD};

/// Returns `true` when `value` is an object carrying a non-empty string `id`
/// and a string `name`.
///
/// Unknown fields are ignored.
#[must_use]
pub fn is_role(value: &Value) -> bool {
    let Value::Object(object) = value else {
        return false;
    };

    let has_id = matches!(object.get(ROLE_ID_FIELD), Some(Value::String(id)) if !id.is_empty());
    let has_name = matches!(object.get(ROLE_NAME_FIELD), Some(Value::String(_)));

    has_id && has_name
}

/// Returns `true` when `value` is an array whose every element passes
/// [`is_role`].
///
/// An empty array is a valid collection. A single malformed element
/// invalidates the whole collection.
#[must_use]
pub fn is_roles(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.iter().all(is_role),
        _ => false,
    }
}

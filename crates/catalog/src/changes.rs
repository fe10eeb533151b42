//! Staged field deltas and their application rules.
//!
//! A delta is an opaque field-to-value map. `null` means "unset that field",
//! which is distinct from omitting the field (no change). Deltas are merged
//! onto the entity's state *as it exists at application time*, so a staged
//! delta applied later lands on state that may have drifted since it was
//! written.

use serde_json::{Map, Value};

use mercantile_core::{DomainError, DomainResult};

/// An opaque field-to-value delta staged against an entity.
pub type ChangeSet = Map<String, Value>;

/// Fields that can never be rewritten through a delta.
///
/// `product` guards variant ownership, `id` guards identity, and `images`
/// are managed exclusively through uploads and removal lists.
pub const GUARDED_FIELDS: &[&str] = &["id", "product", "images"];

/// Reject deltas that touch guarded fields, before any other processing.
pub fn ensure_mutable(changes: &ChangeSet) -> DomainResult<()> {
    for field in GUARDED_FIELDS {
        if changes.contains_key(*field) {
            return Err(DomainError::validation(format!(
                "field '{field}' cannot be changed through an update"
            )));
        }
    }
    Ok(())
}

pub(crate) fn as_required_string(field: &str, value: &Value) -> DomainResult<String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(DomainError::validation(format!(
            "field '{field}' must be a non-empty string"
        ))),
    }
}

pub(crate) fn as_optional_string(field: &str, value: &Value) -> DomainResult<Option<String>> {
    if value.is_null() {
        return Ok(None);
    }
    as_required_string(field, value).map(Some)
}

pub(crate) fn as_optional_u64(field: &str, value: &Value) -> DomainResult<Option<u64>> {
    if value.is_null() {
        return Ok(None);
    }
    value.as_u64().map(Some).ok_or_else(|| {
        DomainError::validation(format!(
            "field '{field}' must be a non-negative integer or null"
        ))
    })
}

pub(crate) fn as_string_list(field: &str, value: &Value) -> DomainResult<Vec<String>> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let items = value.as_array().ok_or_else(|| {
        DomainError::validation(format!("field '{field}' must be an array of strings or null"))
    })?;
    items
        .iter()
        .map(|v| as_required_string(field, v))
        .collect()
}

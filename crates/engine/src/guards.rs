//! Consistency guards: pure predicates consulted before and after store
//! calls. No IO of their own beyond the injected collaborators, no state.

use mercantile_catalog::{CategoryId, VariantId};
use mercantile_core::TenantId;
use mercantile_infra::{CategoryDirectory, InventoryReader, StoreError};

use crate::outcome::EngineError;

/// Fail with `NotFound` unless the referenced category node exists.
pub fn ensure_category_exists<C: CategoryDirectory>(
    categories: &C,
    tenant_id: TenantId,
    id: CategoryId,
) -> Result<(), EngineError> {
    let exists = categories
        .exists(tenant_id, id)
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    if exists {
        Ok(())
    } else {
        Err(EngineError::NotFound(format!("category {id} does not exist")))
    }
}

/// Detect a uniqueness violation in a store error, naming the duplicate
/// identifying field.
pub fn unique_violation(err: &StoreError) -> Option<(&'static str, &str)> {
    match err {
        StoreError::UniqueViolation { field, value } => Some((field, value.as_str())),
        _ => None,
    }
}

/// Whether any inventory record references the variant.
pub fn has_dependent_inventory<I: InventoryReader>(
    inventory: &I,
    tenant_id: TenantId,
    id: VariantId,
) -> Result<bool, EngineError> {
    let count = inventory
        .count_by_variant(tenant_id, id)
        .map_err(|e| EngineError::Internal(e.to_string()))?;
    Ok(count > 0)
}

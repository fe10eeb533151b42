//! Inventory existence collaborator.
//!
//! Stock levels are managed elsewhere; the engine only asks whether any
//! inventory record references a variant (which blocks destructive variant
//! operations).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use mercantile_catalog::VariantId;
use mercantile_core::TenantId;

use crate::store::StoreError;

/// Read-side view of the external inventory service.
pub trait InventoryReader: Send + Sync {
    /// Number of inventory records referencing the variant.
    fn count_by_variant(&self, tenant_id: TenantId, id: VariantId) -> Result<u64, StoreError>;
}

impl<I> InventoryReader for Arc<I>
where
    I: InventoryReader + ?Sized,
{
    fn count_by_variant(&self, tenant_id: TenantId, id: VariantId) -> Result<u64, StoreError> {
        (**self).count_by_variant(tenant_id, id)
    }
}

/// In-memory inventory ledger for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryInventoryLedger {
    counts: RwLock<HashMap<(TenantId, VariantId), u64>>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_count(&self, tenant_id: TenantId, id: VariantId, count: u64) {
        if let Ok(mut counts) = self.counts.write() {
            counts.insert((tenant_id, id), count);
        }
    }
}

impl InventoryReader for InMemoryInventoryLedger {
    fn count_by_variant(&self, tenant_id: TenantId, id: VariantId) -> Result<u64, StoreError> {
        let counts = self
            .counts
            .read()
            .map_err(|_| StoreError::Backend("inventory ledger lock poisoned".to_string()))?;
        Ok(counts.get(&(tenant_id, id)).copied().unwrap_or(0))
    }
}

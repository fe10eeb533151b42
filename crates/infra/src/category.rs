//! Category hierarchy collaborator.
//!
//! The hierarchy itself (tree shape, CRUD, validation) lives in another
//! service; the engine only ever asks whether a referenced node exists.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use mercantile_catalog::CategoryId;
use mercantile_core::TenantId;

use crate::store::StoreError;

/// Read-side view of the external category/catalog hierarchy service.
pub trait CategoryDirectory: Send + Sync {
    fn exists(&self, tenant_id: TenantId, id: CategoryId) -> Result<bool, StoreError>;
}

impl<C> CategoryDirectory for Arc<C>
where
    C: CategoryDirectory + ?Sized,
{
    fn exists(&self, tenant_id: TenantId, id: CategoryId) -> Result<bool, StoreError> {
        (**self).exists(tenant_id, id)
    }
}

/// In-memory category directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCategoryDirectory {
    known: RwLock<HashSet<(TenantId, CategoryId)>>,
}

impl InMemoryCategoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, tenant_id: TenantId, id: CategoryId) {
        if let Ok(mut known) = self.known.write() {
            known.insert((tenant_id, id));
        }
    }
}

impl CategoryDirectory for InMemoryCategoryDirectory {
    fn exists(&self, tenant_id: TenantId, id: CategoryId) -> Result<bool, StoreError> {
        let known = self
            .known
            .read()
            .map_err(|_| StoreError::Backend("category directory lock poisoned".to_string()))?;
        Ok(known.contains(&(tenant_id, id)))
    }
}

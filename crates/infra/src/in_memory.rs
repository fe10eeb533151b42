//! In-memory catalog store.
//!
//! Intended for tests/dev. Not optimized for performance: `commit` stages a
//! full copy of the state, validates it, and swaps it in, which keeps the
//! all-or-nothing guarantee trivially correct.

use std::collections::HashMap;
use std::sync::RwLock;

use mercantile_catalog::{
    ChangeRequestId, ChangeRequestStatus, Product, ProductId, ProductVariant,
    VariantChangeRequest, VariantId,
};
use mercantile_core::TenantId;

use crate::store::{CatalogStore, CatalogWrite, Page, Pagination, StoreError};

#[derive(Debug, Default, Clone)]
struct CatalogState {
    products: HashMap<(TenantId, ProductId), Product>,
    variants: HashMap<(TenantId, VariantId), ProductVariant>,
    requests: HashMap<(TenantId, ChangeRequestId), VariantChangeRequest>,
}

impl CatalogState {
    fn apply(&mut self, tenant_id: TenantId, write: CatalogWrite) -> Result<(), StoreError> {
        match write {
            CatalogWrite::PutProduct(product) => {
                self.products.insert((tenant_id, product.id_typed()), product);
            }
            CatalogWrite::PutVariant(variant) => {
                let key = (tenant_id, variant.id_typed());
                if let Some(existing) = self.variants.get(&key) {
                    if existing.product() != variant.product() {
                        return Err(StoreError::InvalidWrite(format!(
                            "variant {} cannot move between products",
                            variant.id_typed()
                        )));
                    }
                }
                self.variants.insert(key, variant);
            }
            CatalogWrite::DeleteVariant(id) => {
                if self.variants.remove(&(tenant_id, id)).is_none() {
                    return Err(StoreError::Missing(format!("variant {id}")));
                }
            }
            CatalogWrite::PutChangeRequest(request) => {
                self.requests.insert((tenant_id, request.id_typed()), request);
            }
        }
        Ok(())
    }

    /// Uniqueness scan over the staged state.
    ///
    /// `sku`/`barcode` are sparsely unique across the whole store (absence is
    /// never a conflict); product `name` is unique within its tenant.
    fn check_unique(&self) -> Result<(), StoreError> {
        let mut skus: HashMap<&str, VariantId> = HashMap::new();
        let mut barcodes: HashMap<&str, VariantId> = HashMap::new();
        for variant in self.variants.values() {
            if let Some(sku) = variant.sku() {
                if let Some(other) = skus.insert(sku, variant.id_typed()) {
                    if other != variant.id_typed() {
                        return Err(StoreError::UniqueViolation {
                            field: "sku",
                            value: sku.to_string(),
                        });
                    }
                }
            }
            if let Some(barcode) = variant.barcode() {
                if let Some(other) = barcodes.insert(barcode, variant.id_typed()) {
                    if other != variant.id_typed() {
                        return Err(StoreError::UniqueViolation {
                            field: "barcode",
                            value: barcode.to_string(),
                        });
                    }
                }
            }
        }

        let mut names: HashMap<(TenantId, &str), ProductId> = HashMap::new();
        for ((tenant_id, _), product) in &self.products {
            if let Some(other) = names.insert((*tenant_id, product.name()), product.id_typed()) {
                if other != product.id_typed() {
                    return Err(StoreError::UniqueViolation {
                        field: "name",
                        value: product.name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// In-memory, tenant-isolated catalog store.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, CatalogState>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("catalog store lock poisoned".to_string()))
    }
}

impl CatalogStore for InMemoryCatalogStore {
    fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.read_state()?.products.get(&(tenant_id, id)).cloned())
    }

    fn variant(
        &self,
        tenant_id: TenantId,
        id: VariantId,
    ) -> Result<Option<ProductVariant>, StoreError> {
        Ok(self.read_state()?.variants.get(&(tenant_id, id)).cloned())
    }

    fn variants_of_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError> {
        let state = self.read_state()?;
        let mut variants: Vec<ProductVariant> = state
            .variants
            .iter()
            .filter(|((t, _), v)| *t == tenant_id && v.product() == id)
            .map(|(_, v)| v.clone())
            .collect();
        variants.sort_by_key(|v| (v.created_at(), *v.id_typed().0.as_uuid()));
        Ok(variants)
    }

    fn change_request(
        &self,
        tenant_id: TenantId,
        id: ChangeRequestId,
    ) -> Result<Option<VariantChangeRequest>, StoreError> {
        Ok(self.read_state()?.requests.get(&(tenant_id, id)).cloned())
    }

    fn change_requests(
        &self,
        tenant_id: TenantId,
        status: Option<ChangeRequestStatus>,
        page: Pagination,
    ) -> Result<Page<VariantChangeRequest>, StoreError> {
        let state = self.read_state()?;
        let mut matching: Vec<VariantChangeRequest> = state
            .requests
            .iter()
            .filter(|((t, _), r)| *t == tenant_id && status.is_none_or(|s| r.status() == s))
            .map(|(_, r)| r.clone())
            .collect();
        matching.sort_by_key(|r| (r.created_at(), *r.id_typed().0.as_uuid()));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(Page { items, total })
    }

    fn commit(&self, tenant_id: TenantId, writes: Vec<CatalogWrite>) -> Result<(), StoreError> {
        // Payload tenancy is validated before anything is staged.
        for write in &writes {
            let owner = match write {
                CatalogWrite::PutProduct(p) => Some(p.tenant_id()),
                CatalogWrite::PutVariant(v) => Some(v.tenant_id()),
                CatalogWrite::PutChangeRequest(r) => Some(r.tenant_id()),
                CatalogWrite::DeleteVariant(_) => None,
            };
            if let Some(owner) = owner {
                if owner != tenant_id {
                    return Err(StoreError::TenantIsolation(
                        "batch contains an entity from another tenant".to_string(),
                    ));
                }
            }
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|_| StoreError::Backend("catalog store lock poisoned".to_string()))?;

        // Stage the whole batch on a copy, then swap. Any error leaves the
        // live state untouched.
        let mut staged = inner.clone();
        for write in writes {
            staged.apply(tenant_id, write)?;
        }
        staged.check_unique()?;

        *inner = staged;
        Ok(())
    }
}

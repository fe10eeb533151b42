//! Catalog persistence abstraction.
//!
//! Writes are grouped into batches that the store applies as one atomic
//! unit: either every write in the batch lands, or none of them do. The
//! store is also where identifying-field uniqueness is enforced, so the
//! coordinator sees a duplicate sku/barcode/name as a typed error on commit
//! rather than as a partial write.

use std::sync::Arc;

use thiserror::Error;

use mercantile_catalog::{
    ChangeRequestId, ChangeRequestStatus, Product, ProductId, ProductVariant,
    VariantChangeRequest, VariantId,
};
use mercantile_core::TenantId;

/// One write inside an atomic unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWrite {
    PutProduct(Product),
    PutVariant(ProductVariant),
    DeleteVariant(VariantId),
    PutChangeRequest(VariantChangeRequest),
}

/// Catalog store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A sparse unique index was violated. Names the identifying field so
    /// callers can surface it.
    #[error("duplicate {field}: '{value}' is already in use")]
    UniqueViolation { field: &'static str, value: String },

    /// A write targeted a row that does not exist.
    #[error("not found: {0}")]
    Missing(String),

    /// A batch mixed tenants or wrote an entity into the wrong tenant scope.
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// A write violated a structural rule (e.g. variant ownership rewrite).
    #[error("invalid write: {0}")]
    InvalidWrite(String),

    /// Unexpected storage backend failure.
    #[error("storage failure: {0}")]
    Backend(String),
}

/// Pagination window for listings.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    /// Maximum number of records to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(200), // Cap for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// One page of a listing plus the total match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Tenant-scoped catalog document store.
///
/// Implementations must:
/// - enforce tenant isolation on reads and writes
/// - apply each `commit` batch atomically (all or nothing)
/// - enforce sparse uniqueness of variant `sku`/`barcode` and per-tenant
///   uniqueness of product `name`, reporting violations as
///   [`StoreError::UniqueViolation`]
/// - reject rewrites of a variant's owning product
pub trait CatalogStore: Send + Sync {
    fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, StoreError>;

    fn variant(
        &self,
        tenant_id: TenantId,
        id: VariantId,
    ) -> Result<Option<ProductVariant>, StoreError>;

    /// Every variant owned by the product, in creation order.
    fn variants_of_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError>;

    fn change_request(
        &self,
        tenant_id: TenantId,
        id: ChangeRequestId,
    ) -> Result<Option<VariantChangeRequest>, StoreError>;

    /// Change requests filtered by status (None = all), oldest first.
    fn change_requests(
        &self,
        tenant_id: TenantId,
        status: Option<ChangeRequestStatus>,
        page: Pagination,
    ) -> Result<Page<VariantChangeRequest>, StoreError>;

    /// Apply a batch of writes as one atomic unit.
    fn commit(&self, tenant_id: TenantId, writes: Vec<CatalogWrite>) -> Result<(), StoreError>;
}

impl<S> CatalogStore for Arc<S>
where
    S: CatalogStore + ?Sized,
{
    fn product(&self, tenant_id: TenantId, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).product(tenant_id, id)
    }

    fn variant(
        &self,
        tenant_id: TenantId,
        id: VariantId,
    ) -> Result<Option<ProductVariant>, StoreError> {
        (**self).variant(tenant_id, id)
    }

    fn variants_of_product(
        &self,
        tenant_id: TenantId,
        id: ProductId,
    ) -> Result<Vec<ProductVariant>, StoreError> {
        (**self).variants_of_product(tenant_id, id)
    }

    fn change_request(
        &self,
        tenant_id: TenantId,
        id: ChangeRequestId,
    ) -> Result<Option<VariantChangeRequest>, StoreError> {
        (**self).change_request(tenant_id, id)
    }

    fn change_requests(
        &self,
        tenant_id: TenantId,
        status: Option<ChangeRequestStatus>,
        page: Pagination,
    ) -> Result<Page<VariantChangeRequest>, StoreError> {
        (**self).change_requests(tenant_id, status, page)
    }

    fn commit(&self, tenant_id: TenantId, writes: Vec<CatalogWrite>) -> Result<(), StoreError> {
        (**self).commit(tenant_id, writes)
    }
}

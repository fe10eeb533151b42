//! Operation outcome vocabulary.
//!
//! Every engine operation resolves to exactly one outcome kind: a payload,
//! an accepted-pending-review payload, or one of the error kinds below. No
//! operation leaks partial state into an error.

use thiserror::Error;

use mercantile_catalog::{Product, ProductVariant, VariantChangeRequest};
use mercantile_core::DomainError;
use mercantile_infra::StoreError;
use mercantile_media::MediaError;

/// Engine operation error, the caller-facing error vocabulary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or missing required input. Never produced after a write.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced category/product/variant/request is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness violation, dependent-inventory block, or terminal state
    /// transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The actor may not perform this operation.
    #[error("unauthorized")]
    Unauthorized,

    /// Unexpected store or media failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::NotFound(msg) => EngineError::NotFound(msg),
            DomainError::Conflict(msg) => EngineError::Conflict(msg),
            DomainError::Unauthorized => EngineError::Unauthorized,
            DomainError::Internal(msg) => EngineError::Internal(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { field, value } => {
                EngineError::Conflict(format!("duplicate {field} '{value}'"))
            }
            StoreError::Missing(msg) => EngineError::NotFound(msg),
            StoreError::TenantIsolation(_) => EngineError::Unauthorized,
            StoreError::InvalidWrite(msg) | StoreError::Backend(msg) => {
                EngineError::Internal(msg)
            }
        }
    }
}

impl From<MediaError> for EngineError {
    fn from(err: MediaError) -> Self {
        EngineError::Internal(err.to_string())
    }
}

/// A product together with its full variant set, as returned by the
/// coordinator operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithVariants {
    pub product: Product,
    pub variants: Vec<ProductVariant>,
}

/// Result of a routed variant update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantMutation {
    /// The delta was applied and persisted synchronously.
    Applied(ProductVariant),
    /// The delta was staged as a pending change request for review.
    PendingReview(VariantChangeRequest),
}

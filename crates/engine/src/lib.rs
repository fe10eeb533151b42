//! `mercantile-engine` — the catalog mutation engine.
//!
//! Composes the catalog store, media store, category directory, and
//! inventory reader behind three operation groups:
//!
//! - the **coordinator** (product-with-variants creation and reconciling
//!   updates, atomic with compensating media cleanup),
//! - the **router** (single-variant writes, applied directly or staged for
//!   review depending on caller privilege),
//! - the **moderation** surface (listing, approving, rejecting change
//!   requests).
//!
//! All generics follow the same shape as the infrastructure seams: use the
//! in-memory implementations in tests/dev and swap real backends in without
//! touching the operations.

use std::sync::Arc;

use mercantile_auth::Authorization;

pub mod coordinator;
pub mod guards;
pub mod input;
pub mod moderation;
pub mod outcome;
pub mod router;

pub use input::{CreateProductInput, NewVariant, UpdateProductInput, VariantUpsert};
pub use outcome::{EngineError, ProductWithVariants, VariantMutation};

/// Catalog mutation engine over injected infrastructure seams.
pub struct CatalogEngine<S, M, C, I> {
    store: S,
    media: M,
    categories: C,
    inventory: I,
    authz: Arc<dyn Authorization>,
}

impl<S, M, C, I> CatalogEngine<S, M, C, I> {
    pub fn new(
        store: S,
        media: M,
        categories: C,
        inventory: I,
        authz: Arc<dyn Authorization>,
    ) -> Self {
        Self {
            store,
            media,
            categories,
            inventory,
            authz,
        }
    }
}

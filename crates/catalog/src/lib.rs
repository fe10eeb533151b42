//! `mercantile-catalog` — catalog domain entities.
//!
//! Products, their variants, and the moderation records that stage variant
//! edits for review. Pure domain: no storage, no media IO.

pub mod change_request;
pub mod changes;
pub mod image;
pub mod product;
pub mod variant;

pub use change_request::{
    ChangeRequestId, ChangeRequestStatus, VariantChangeRequest, AUTO_REJECT_VARIANT_GONE,
};
pub use changes::{ensure_mutable, ChangeSet, GUARDED_FIELDS};
pub use image::Image;
pub use product::{staged_category, CategoryId, Product, ProductDraft, ProductId};
pub use variant::{LocationPrice, ProductVariant, VariantDraft, VariantId};

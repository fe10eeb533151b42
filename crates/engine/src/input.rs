//! Operation inputs.
//!
//! No wire format is mandated here; the caller-facing layer (HTTP, CLI,
//! tests) assembles these from whatever transport it speaks.

use mercantile_catalog::{ChangeSet, ProductDraft, VariantDraft, VariantId};
use mercantile_media::{FileUpload, MediaUrl};

/// One variant to create alongside a product (or on its own).
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub draft: VariantDraft,
    pub files: Vec<FileUpload>,
}

impl NewVariant {
    pub fn new(draft: VariantDraft) -> Self {
        Self { draft, files: Vec::new() }
    }
}

/// Payload for `create_product_with_variants`.
#[derive(Debug, Clone)]
pub struct CreateProductInput {
    pub product: ProductDraft,
    /// Files uploaded for the product's own image list.
    pub files: Vec<FileUpload>,
    /// At least one variant is required.
    pub variants: Vec<NewVariant>,
}

/// One entry in the complete target variant list of a product update.
///
/// With an `id` this updates an existing variant of the product; without one
/// it creates a new variant from `changes`. Existing variants absent from
/// the submitted list are deleted.
#[derive(Debug, Clone, Default)]
pub struct VariantUpsert {
    pub id: Option<VariantId>,
    pub changes: ChangeSet,
    pub files: Vec<FileUpload>,
    pub images_to_remove: Vec<MediaUrl>,
}

/// Payload for `update_product_with_variants`.
#[derive(Debug, Clone, Default)]
pub struct UpdateProductInput {
    /// Partial product delta (`null` unsets a field, omission changes nothing).
    pub changes: ChangeSet,
    /// Files appended to the product's image list.
    pub files: Vec<FileUpload>,
    /// Product image URLs to drop and delete from the media store after commit.
    pub images_to_remove: Vec<MediaUrl>,
    /// The complete target variant list.
    pub variants: Vec<VariantUpsert>,
}

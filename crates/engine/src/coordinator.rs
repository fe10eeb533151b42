//! Transactional mutation coordinator.
//!
//! Product-with-variants mutations run as one atomic store unit. Media is
//! uploaded before the unit commits and tracked in an [`UploadBatch`]; if
//! the unit aborts for any reason, every URL uploaded during the attempt is
//! purged best-effort. Media deletions for removed images only ever happen
//! *after* a successful commit, so no object is deleted for a change that
//! did not durably persist.

use std::collections::HashSet;

use chrono::Utc;

use mercantile_auth::Actor;
use mercantile_catalog::{
    ensure_mutable, staged_category, Image, Product, ProductId, ProductVariant, VariantDraft,
    VariantId,
};
use mercantile_core::EntityId;
use mercantile_infra::{CatalogStore, CatalogWrite, CategoryDirectory, InventoryReader};
use mercantile_media::{purge_urls, FileUpload, MediaStore, MediaUrl, UploadBatch};

use crate::guards;
use crate::input::{CreateProductInput, UpdateProductInput};
use crate::outcome::{EngineError, ProductWithVariants};
use crate::CatalogEngine;

impl<S, M, C, I> CatalogEngine<S, M, C, I>
where
    S: CatalogStore,
    M: MediaStore,
    C: CategoryDirectory,
    I: InventoryReader,
{
    /// Create a product together with its initial variant set.
    ///
    /// The product and all variants appear or fail as a single unit.
    pub fn create_product_with_variants(
        &self,
        actor: &Actor,
        input: CreateProductInput,
    ) -> Result<ProductWithVariants, EngineError> {
        if input.variants.is_empty() {
            return Err(EngineError::Validation(
                "at least one variant is required".to_string(),
            ));
        }
        input.product.validate()?;
        for entry in &input.variants {
            entry.draft.validate()?;
        }
        guards::ensure_category_exists(&self.categories, actor.tenant_id, input.product.category)?;

        let mut batch = UploadBatch::new();
        match self.create_attempt(actor, &input, &mut batch) {
            Ok(created) => {
                tracing::info!(
                    product = %created.product.id_typed(),
                    variants = created.variants.len(),
                    "created product with variants"
                );
                Ok(created)
            }
            Err(e) => {
                batch.purge(&self.media);
                Err(e)
            }
        }
    }

    fn create_attempt(
        &self,
        actor: &Actor,
        input: &CreateProductInput,
        batch: &mut UploadBatch,
    ) -> Result<ProductWithVariants, EngineError> {
        let now = Utc::now();

        let product_images = upload_images(&self.media, batch, &input.files)?;
        let product = Product::new(
            ProductId::new(EntityId::new()),
            actor.tenant_id,
            input.product.clone(),
            product_images,
            now,
        )?;

        let mut writes = vec![CatalogWrite::PutProduct(product.clone())];
        let mut variants = Vec::with_capacity(input.variants.len());
        for entry in &input.variants {
            let images = upload_images(&self.media, batch, &entry.files)?;
            let variant = ProductVariant::new(
                VariantId::new(EntityId::new()),
                actor.tenant_id,
                product.id_typed(),
                entry.draft.clone(),
                images,
                now,
            )?;
            writes.push(CatalogWrite::PutVariant(variant.clone()));
            variants.push(variant);
        }

        commit_unit(&self.store, actor, writes)?;
        Ok(ProductWithVariants { product, variants })
    }

    /// Update a product and reconcile its variant set against a complete
    /// target list: entries with an id update, entries without one create,
    /// and existing variants absent from the list are deleted.
    ///
    /// A variant slated for deletion that still has dependent inventory
    /// fails the whole operation before anything is written.
    pub fn update_product_with_variants(
        &self,
        actor: &Actor,
        product_id: ProductId,
        input: UpdateProductInput,
    ) -> Result<ProductWithVariants, EngineError> {
        ensure_mutable(&input.changes)?;
        for entry in &input.variants {
            ensure_mutable(&entry.changes)?;
        }
        if let Some(category) = staged_category(&input.changes)? {
            guards::ensure_category_exists(&self.categories, actor.tenant_id, category)?;
        }

        let product = self
            .store
            .product(actor.tenant_id, product_id)?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;
        let existing = self.store.variants_of_product(actor.tenant_id, product_id)?;

        let mut targets: HashSet<VariantId> = HashSet::new();
        for entry in &input.variants {
            if let Some(id) = entry.id {
                if !existing.iter().any(|v| v.id_typed() == id) {
                    return Err(EngineError::NotFound(format!(
                        "variant {id} does not belong to product {product_id}"
                    )));
                }
                targets.insert(id);
            }
        }

        // Inventory guard on every variant slated for deletion: fail-fast,
        // before any upload or write.
        let mut doomed = Vec::new();
        for variant in &existing {
            if !targets.contains(&variant.id_typed()) {
                let id = variant.id_typed();
                if guards::has_dependent_inventory(&self.inventory, actor.tenant_id, id)? {
                    return Err(EngineError::Conflict(format!(
                        "cannot delete variant {id} with dependent inventory"
                    )));
                }
                doomed.push(variant.clone());
            }
        }

        let mut batch = UploadBatch::new();
        match self.update_attempt(actor, product, &existing, &doomed, &input, &mut batch) {
            Ok((updated, removed_urls)) => {
                // Removed/replaced images are deleted only after the unit
                // durably committed.
                purge_urls(&self.media, &removed_urls);
                tracing::info!(
                    product = %product_id,
                    variants = updated.variants.len(),
                    deleted = doomed.len(),
                    "updated product with variants"
                );
                Ok(updated)
            }
            Err(e) => {
                batch.purge(&self.media);
                Err(e)
            }
        }
    }

    fn update_attempt(
        &self,
        actor: &Actor,
        mut product: Product,
        existing: &[ProductVariant],
        doomed: &[ProductVariant],
        input: &UpdateProductInput,
        batch: &mut UploadBatch,
    ) -> Result<(ProductWithVariants, Vec<MediaUrl>), EngineError> {
        let now = Utc::now();
        let mut removed_urls: Vec<MediaUrl> = Vec::new();

        if !input.changes.is_empty() {
            product.apply_changes(&input.changes, now)?;
        }
        let new_images = upload_images(&self.media, batch, &input.files)?;
        product.push_images(new_images);
        removed_urls.extend(product.remove_images(&input.images_to_remove));

        let mut writes = vec![CatalogWrite::PutProduct(product.clone())];
        let mut variants = Vec::with_capacity(input.variants.len());
        for entry in &input.variants {
            let mut variant = match entry.id {
                Some(id) => {
                    let mut variant = existing
                        .iter()
                        .find(|v| v.id_typed() == id)
                        .cloned()
                        .ok_or_else(|| {
                            EngineError::Internal(format!("variant {id} vanished mid-update"))
                        })?;
                    if !entry.changes.is_empty() {
                        variant.apply_changes(&entry.changes, now)?;
                    }
                    variant
                }
                None => {
                    let draft = VariantDraft::from_changes(&entry.changes)?;
                    ProductVariant::new(
                        VariantId::new(EntityId::new()),
                        actor.tenant_id,
                        product.id_typed(),
                        draft,
                        Vec::new(),
                        now,
                    )?
                }
            };
            let images = upload_images(&self.media, batch, &entry.files)?;
            variant.push_images(images);
            removed_urls.extend(variant.remove_images(&entry.images_to_remove));
            writes.push(CatalogWrite::PutVariant(variant.clone()));
            variants.push(variant);
        }

        for variant in doomed {
            writes.push(CatalogWrite::DeleteVariant(variant.id_typed()));
            // Owned media of deleted variants is purged once the unit commits.
            removed_urls.extend(variant.image_urls());
        }

        commit_unit(&self.store, actor, writes)?;
        Ok((ProductWithVariants { product, variants }, removed_urls))
    }
}

/// Commit one atomic unit, translating uniqueness violations distinctly.
pub(crate) fn commit_unit<S: CatalogStore>(
    store: &S,
    actor: &Actor,
    writes: Vec<CatalogWrite>,
) -> Result<(), EngineError> {
    store.commit(actor.tenant_id, writes).map_err(|e| {
        if let Some((field, value)) = guards::unique_violation(&e) {
            tracing::warn!(field, value, "atomic unit aborted by uniqueness conflict");
        }
        EngineError::from(e)
    })
}

pub(crate) fn upload_images<M: MediaStore>(
    media: &M,
    batch: &mut UploadBatch,
    files: &[FileUpload],
) -> Result<Vec<Image>, EngineError> {
    files
        .iter()
        .map(|file| {
            let url = batch.upload(media, file)?;
            Ok(Image::new(url, file.alt_text.clone()))
        })
        .collect()
}

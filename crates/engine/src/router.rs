//! Variant mutation router.
//!
//! Single-variant writes are routed by caller privilege: privileged actors
//! mutate the live variant synchronously; everyone else gets their delta
//! staged as a pending change request. Deltas that try to rewrite variant
//! ownership are rejected before any processing, for both actor classes.

use chrono::Utc;

use mercantile_auth::Actor;
use mercantile_catalog::{
    ensure_mutable, ChangeRequestId, ChangeSet, ProductId, ProductVariant,
    VariantChangeRequest, VariantDraft, VariantId,
};
use mercantile_core::EntityId;
use mercantile_infra::{CatalogStore, CatalogWrite, CategoryDirectory, InventoryReader};
use mercantile_media::{purge_urls, FileUpload, MediaStore, UploadBatch};

use crate::coordinator::{commit_unit, upload_images};
use crate::guards;
use crate::outcome::{EngineError, VariantMutation};
use crate::CatalogEngine;

impl<S, M, C, I> CatalogEngine<S, M, C, I>
where
    S: CatalogStore,
    M: MediaStore,
    C: CategoryDirectory,
    I: InventoryReader,
{
    /// Add a variant to an existing product, with the same upload/rollback
    /// discipline as product creation, scoped to this one entity.
    pub fn create_variant(
        &self,
        actor: &Actor,
        product_id: ProductId,
        draft: VariantDraft,
        files: Vec<FileUpload>,
    ) -> Result<ProductVariant, EngineError> {
        draft.validate()?;
        self.store
            .product(actor.tenant_id, product_id)?
            .ok_or_else(|| EngineError::NotFound(format!("product {product_id}")))?;

        let mut batch = UploadBatch::new();
        let attempt = (|| -> Result<ProductVariant, EngineError> {
            let images = upload_images(&self.media, &mut batch, &files)?;
            let variant = ProductVariant::new(
                VariantId::new(EntityId::new()),
                actor.tenant_id,
                product_id,
                draft,
                images,
                Utc::now(),
            )?;
            commit_unit(&self.store, actor, vec![CatalogWrite::PutVariant(variant.clone())])?;
            Ok(variant)
        })();

        match attempt {
            Ok(variant) => {
                tracing::info!(variant = %variant.id_typed(), product = %product_id, "created variant");
                Ok(variant)
            }
            Err(e) => {
                batch.purge(&self.media);
                Err(e)
            }
        }
    }

    /// Route a variant delta by caller privilege.
    pub fn update_variant(
        &self,
        actor: &Actor,
        variant_id: VariantId,
        changes: ChangeSet,
    ) -> Result<VariantMutation, EngineError> {
        if changes.is_empty() {
            return Err(EngineError::Validation("no fields to update".to_string()));
        }
        // Ownership rewrites are rejected before any processing, regardless
        // of privilege.
        ensure_mutable(&changes)?;

        let variant = self
            .store
            .variant(actor.tenant_id, variant_id)?
            .ok_or_else(|| EngineError::NotFound(format!("variant {variant_id}")))?;

        if self.authz.can_apply_directly(actor) {
            let mut updated = variant;
            updated.apply_changes(&changes, Utc::now())?;
            commit_unit(
                &self.store,
                actor,
                vec![CatalogWrite::PutVariant(updated.clone())],
            )?;
            tracing::info!(variant = %variant_id, actor = %actor.id, "applied variant update");
            Ok(VariantMutation::Applied(updated))
        } else {
            let request = VariantChangeRequest::new(
                ChangeRequestId::new(EntityId::new()),
                actor.tenant_id,
                variant_id,
                actor.id,
                changes,
                Utc::now(),
            )?;
            commit_unit(
                &self.store,
                actor,
                vec![CatalogWrite::PutChangeRequest(request.clone())],
            )?;
            tracing::info!(
                variant = %variant_id,
                request = %request.id_typed(),
                actor = %actor.id,
                "staged variant update for review"
            );
            Ok(VariantMutation::PendingReview(request))
        }
    }

    /// Delete a variant, unless dependent inventory blocks it. Owned media
    /// is purged best-effort after the delete commits.
    pub fn delete_variant(&self, actor: &Actor, variant_id: VariantId) -> Result<(), EngineError> {
        let variant = self
            .store
            .variant(actor.tenant_id, variant_id)?
            .ok_or_else(|| EngineError::NotFound(format!("variant {variant_id}")))?;

        if guards::has_dependent_inventory(&self.inventory, actor.tenant_id, variant_id)? {
            return Err(EngineError::Conflict(format!(
                "cannot delete variant {variant_id} with dependent inventory"
            )));
        }

        commit_unit(&self.store, actor, vec![CatalogWrite::DeleteVariant(variant_id)])?;
        purge_urls(&self.media, &variant.image_urls());
        tracing::info!(variant = %variant_id, "deleted variant");
        Ok(())
    }
}

//! Change-request state machine operations.
//!
//! A request's staged delta is applied to the variant's state as it exists
//! at approval time; there is no optimistic-concurrency token tying the
//! request to the state it was filed against. Approval and rejection are
//! terminal; re-reviewing a settled request conflicts.

use chrono::Utc;

use mercantile_auth::Actor;
use mercantile_catalog::{
    ChangeRequestId, ChangeRequestStatus, ProductVariant, VariantChangeRequest,
    AUTO_REJECT_VARIANT_GONE,
};
use mercantile_infra::{
    CatalogStore, CatalogWrite, CategoryDirectory, InventoryReader, Page, Pagination,
};
use mercantile_media::MediaStore;

use crate::coordinator::commit_unit;
use crate::outcome::EngineError;
use crate::CatalogEngine;

impl<S, M, C, I> CatalogEngine<S, M, C, I>
where
    S: CatalogStore,
    M: MediaStore,
    C: CategoryDirectory,
    I: InventoryReader,
{
    /// List change requests for review, filtered by status (default pending).
    pub fn list_change_requests(
        &self,
        actor: &Actor,
        status: Option<ChangeRequestStatus>,
        page: Pagination,
    ) -> Result<Page<VariantChangeRequest>, EngineError> {
        if !self.authz.can_moderate(actor) {
            return Err(EngineError::Unauthorized);
        }
        let status = status.unwrap_or(ChangeRequestStatus::Pending);
        Ok(self
            .store
            .change_requests(actor.tenant_id, Some(status), page)?)
    }

    /// Approve a pending request: its staged delta is merged onto the
    /// variant's *current* state and both records persist in one unit.
    ///
    /// If the target variant no longer exists, the request auto-transitions
    /// to rejected with a system reason (so it cannot clog the review queue)
    /// and the call reports not-found. A uniqueness conflict on commit
    /// leaves the request pending so it can be retried or rejected
    /// explicitly.
    pub fn approve_change_request(
        &self,
        actor: &Actor,
        request_id: ChangeRequestId,
    ) -> Result<ProductVariant, EngineError> {
        if !self.authz.can_moderate(actor) {
            return Err(EngineError::Unauthorized);
        }
        let mut request = self
            .store
            .change_request(actor.tenant_id, request_id)?
            .ok_or_else(|| EngineError::NotFound(format!("change request {request_id}")))?;
        request.ensure_pending()?;

        let variant_id = request.variant();
        let Some(mut variant) = self.store.variant(actor.tenant_id, variant_id)? else {
            request.reject(actor.id, AUTO_REJECT_VARIANT_GONE, Utc::now())?;
            commit_unit(
                &self.store,
                actor,
                vec![CatalogWrite::PutChangeRequest(request)],
            )?;
            tracing::warn!(
                request = %request_id,
                variant = %variant_id,
                "auto-rejected change request: target variant gone"
            );
            return Err(EngineError::NotFound(format!(
                "variant {variant_id} no longer exists"
            )));
        };

        // A delta that no longer validates against current state also leaves
        // the request pending.
        variant.apply_changes(request.changes(), Utc::now())?;
        request.approve(actor.id, Utc::now())?;
        commit_unit(
            &self.store,
            actor,
            vec![
                CatalogWrite::PutVariant(variant.clone()),
                CatalogWrite::PutChangeRequest(request),
            ],
        )?;
        tracing::info!(request = %request_id, variant = %variant_id, reviewer = %actor.id, "approved change request");
        Ok(variant)
    }

    /// Reject a pending request with a required reason.
    pub fn reject_change_request(
        &self,
        actor: &Actor,
        request_id: ChangeRequestId,
        reason: &str,
    ) -> Result<VariantChangeRequest, EngineError> {
        if !self.authz.can_moderate(actor) {
            return Err(EngineError::Unauthorized);
        }
        let mut request = self
            .store
            .change_request(actor.tenant_id, request_id)?
            .ok_or_else(|| EngineError::NotFound(format!("change request {request_id}")))?;

        request.reject(actor.id, reason, Utc::now())?;
        commit_unit(
            &self.store,
            actor,
            vec![CatalogWrite::PutChangeRequest(request.clone())],
        )?;
        tracing::info!(request = %request_id, reviewer = %actor.id, "rejected change request");
        Ok(request)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mercantile_auth::PrincipalId;
use mercantile_core::{DomainError, DomainResult, Entity, EntityId, TenantId};

use crate::changes::{self, ChangeSet};
use crate::variant::VariantId;

/// Change request identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeRequestId(pub EntityId);

impl ChangeRequestId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ChangeRequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Moderation lifecycle of a change request.
///
/// `Pending` is the only non-terminal state; `Approved` and `Rejected` can
/// never be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl core::fmt::Display for ChangeRequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            ChangeRequestStatus::Pending => "pending",
            ChangeRequestStatus::Approved => "approved",
            ChangeRequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// System-generated reason stored when an approval finds its target gone.
pub const AUTO_REJECT_VARIANT_GONE: &str = "target variant no longer exists";

/// Moderation record staging a proposed edit to a variant.
///
/// The staged delta is applied to the variant's state *as it exists at
/// approval time*, not as it existed at request time; stale requests can
/// therefore produce different results than the requester anticipated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantChangeRequest {
    id: ChangeRequestId,
    tenant_id: TenantId,
    variant: VariantId,
    requested_by: PrincipalId,
    changes: ChangeSet,
    status: ChangeRequestStatus,
    reviewed_by: Option<PrincipalId>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    reviewed_at: Option<DateTime<Utc>>,
}

impl VariantChangeRequest {
    pub fn new(
        id: ChangeRequestId,
        tenant_id: TenantId,
        variant: VariantId,
        requested_by: PrincipalId,
        staged: ChangeSet,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if staged.is_empty() {
            return Err(DomainError::validation("change request carries no changes"));
        }
        changes::ensure_mutable(&staged)?;
        Ok(Self {
            id,
            tenant_id,
            variant,
            requested_by,
            changes: staged,
            status: ChangeRequestStatus::Pending,
            reviewed_by: None,
            rejection_reason: None,
            created_at: now,
            reviewed_at: None,
        })
    }

    pub fn id_typed(&self) -> ChangeRequestId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn variant(&self) -> VariantId {
        self.variant
    }

    pub fn requested_by(&self) -> PrincipalId {
        self.requested_by
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn status(&self) -> ChangeRequestStatus {
        self.status
    }

    pub fn reviewed_by(&self) -> Option<PrincipalId> {
        self.reviewed_by
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == ChangeRequestStatus::Pending
    }

    /// Fail with a conflict naming the settled status unless still pending.
    pub fn ensure_pending(&self) -> DomainResult<()> {
        if !self.is_pending() {
            return Err(DomainError::conflict(format!(
                "change request already {}",
                self.status
            )));
        }
        Ok(())
    }

    /// Transition `pending → approved`. Terminal.
    pub fn approve(&mut self, reviewer: PrincipalId, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_pending()?;
        self.status = ChangeRequestStatus::Approved;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Transition `pending → rejected` with a required reason. Terminal.
    pub fn reject(
        &mut self,
        reviewer: PrincipalId,
        reason: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if reason.trim().is_empty() {
            return Err(DomainError::validation("rejection reason is required"));
        }
        self.ensure_pending()?;
        self.status = ChangeRequestStatus::Rejected;
        self.reviewed_by = Some(reviewer);
        self.rejection_reason = Some(reason.to_string());
        self.reviewed_at = Some(now);
        Ok(())
    }
}

impl Entity for VariantChangeRequest {
    type Id = ChangeRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

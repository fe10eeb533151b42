use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mercantile_core::TenantId;

use crate::Role;

/// Identity of an authenticated principal (human user, service account, etc).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PrincipalId> for Uuid {
    fn from(value: PrincipalId) -> Self {
        value.0
    }
}

impl FromStr for PrincipalId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::from_str(s)?))
    }
}

/// A resolved caller identity for mutation routing.
///
/// Construction is intentionally decoupled from storage and transport: the
/// caller-facing layer derives an `Actor` from its auth context. When no
/// authenticated identity is resolvable it must construct the explicit
/// least-privileged fallback via [`Actor::least_privileged`] rather than
/// treating the absence as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: PrincipalId,
    pub tenant_id: TenantId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: PrincipalId, tenant_id: TenantId, role: Role) -> Self {
        Self { id, tenant_id, role }
    }

    /// Fallback identity for unauthenticated callers: synthesized id, lowest
    /// privilege. Never bypasses the mutation router.
    pub fn least_privileged(tenant_id: TenantId) -> Self {
        Self {
            id: PrincipalId::new(),
            tenant_id,
            role: Role::viewer(),
        }
    }
}

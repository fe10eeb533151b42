use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for privilege routing.
///
/// Roles are intentionally opaque strings at this layer; mapping roles to
/// capabilities is done by the policy layer (see `authorize`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full catalog mutation rights.
    pub fn admin() -> Self {
        Self(Cow::Borrowed("admin"))
    }

    /// Store-level management rights (applies mutations directly).
    pub fn manager() -> Self {
        Self(Cow::Borrowed("manager"))
    }

    /// Day-to-day staff: mutations are staged for review.
    pub fn staff() -> Self {
        Self(Cow::Borrowed("staff"))
    }

    /// Read-only fallback role.
    pub fn viewer() -> Self {
        Self(Cow::Borrowed("viewer"))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

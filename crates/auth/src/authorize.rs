use std::collections::HashSet;
use std::sync::Arc;

use crate::{Actor, Role};

/// Capability check injected into the mutation router.
///
/// The router only ever asks one question: may this actor's writes bypass
/// moderation? Richer role models can replace the implementation without
/// touching the router or the change-request state machine.
pub trait Authorization: Send + Sync {
    /// Whether the actor's variant mutations are applied directly instead of
    /// being staged as change requests.
    fn can_apply_directly(&self, actor: &Actor) -> bool;

    /// Whether the actor may review (list/approve/reject) change requests.
    ///
    /// Defaults to the direct-apply capability: whoever can bypass moderation
    /// can also moderate.
    fn can_moderate(&self, actor: &Actor) -> bool {
        self.can_apply_directly(actor)
    }
}

impl<A> Authorization for Arc<A>
where
    A: Authorization + ?Sized,
{
    fn can_apply_directly(&self, actor: &Actor) -> bool {
        (**self).can_apply_directly(actor)
    }

    fn can_moderate(&self, actor: &Actor) -> bool {
        (**self).can_moderate(actor)
    }
}

/// Role-table policy: a fixed set of roles is privileged.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
#[derive(Debug, Clone)]
pub struct RolePolicy {
    privileged: HashSet<Role>,
}

impl RolePolicy {
    pub fn new(privileged: impl IntoIterator<Item = Role>) -> Self {
        Self {
            privileged: privileged.into_iter().collect(),
        }
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new([Role::admin(), Role::manager()])
    }
}

impl Authorization for RolePolicy {
    fn can_apply_directly(&self, actor: &Actor) -> bool {
        self.privileged.contains(&actor.role)
    }
}

//! `mercantile-auth` — actor identity and privilege routing policy.
//!
//! Authentication and role resolution are external collaborators; this crate
//! only models the resolved identity (`Actor`) and the capability seam the
//! mutation router consults (`Authorization`).

pub mod authorize;
pub mod principal;
pub mod roles;

pub use authorize::{Authorization, RolePolicy};
pub use principal::{Actor, PrincipalId};
pub use roles::Role;

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod context;
pub mod holder;
pub mod principal;
pub mod snapshot;
pub mod tenant;

pub use context::{SecurityContext, SecurityContextBuilder};
pub use holder::{NoActiveContext, SecurityContextHolder};
pub use principal::{GrantType, Principal, PrincipalClaims, PrincipalKind};
pub use snapshot::{ContextSnapshot, ContextSnapshotBuilder};
pub use tenant::TenantId;

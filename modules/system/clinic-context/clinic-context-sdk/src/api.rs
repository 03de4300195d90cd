//! Collaborator traits consumed by the context pipeline.
//!
//! All calls may block on the tenant's data store; implementations must not cache
//! results across requests where noted, since permissions can change between requests.

use async_trait::async_trait;
use carebridge_security::{ContextSnapshot, Principal, TenantId};

use crate::error::{ContextStoreError, EntitlementError, TenantRegistryError, TokenIntrospectionError};
use crate::models::{AuthenticatedToken, RegistryEntry};

/// Resolves a bearer token that was already validated upstream.
#[async_trait]
pub trait TokenIntrospectionClient: Send + Sync {
    /// Resolve the principal, scopes and extensions bound to `bearer_token`.
    ///
    /// # Arguments
    ///
    /// * `bearer_token` - The raw bearer token string (without "Bearer " prefix)
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the token is unknown or rejected
    /// - `Unavailable` if the token store cannot be reached
    /// - `Internal` for unexpected errors
    async fn introspect(&self, bearer_token: &str)
    -> Result<AuthenticatedToken, TokenIntrospectionError>;
}

/// Read access to a tenant's own registry table.
#[async_trait]
pub trait TenantRegistryClient: Send + Sync {
    /// Live lookup of the registry entries stored for `tenant`.
    ///
    /// # Errors
    ///
    /// - `TenantNotFound` if no data store is configured for `tenant`
    /// - `Unavailable` if the tenant's data store cannot be reached
    /// - `Internal` for unexpected errors
    async fn registry_entries(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RegistryEntry>, TenantRegistryError>;
}

/// Loads the permission/context snapshot for a principal.
#[async_trait]
pub trait ContextSnapshotClient: Send + Sync {
    /// Fetch a fresh snapshot. Called exactly once per request.
    ///
    /// # Errors
    ///
    /// - `TenantNotFound` / `PrincipalNotFound` when the tenant or principal is unknown
    /// - `Unavailable` if the tenant's data store cannot be reached
    /// - `Internal` for unexpected errors
    async fn load_snapshot(
        &self,
        tenant: &TenantId,
        principal: &Principal,
    ) -> Result<ContextSnapshot, ContextStoreError>;
}

/// Coarse-grained per-tenant feature enablement.
#[async_trait]
pub trait ModuleEntitlementClient: Send + Sync {
    /// Whether the patient-facing REST API is enabled for `tenant`.
    ///
    /// # Errors
    ///
    /// Returns an error when the flag cannot be read. Callers must treat this as a
    /// server failure, never as "disabled".
    async fn patient_api_enabled(&self, tenant: &TenantId) -> Result<bool, EntitlementError>;
}

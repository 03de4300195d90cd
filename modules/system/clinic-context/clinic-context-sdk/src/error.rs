//! Error types for the clinic context collaborators.

use carebridge_security::TenantId;
use thiserror::Error;

/// Errors returned by [`crate::TokenIntrospectionClient`].
#[derive(Debug, Error)]
pub enum TokenIntrospectionError {
    /// The token is unknown, revoked, or malformed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The token store cannot be reached.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by [`crate::TenantRegistryClient`].
#[derive(Debug, Error)]
pub enum TenantRegistryError {
    /// No data store is configured for this tenant.
    #[error("tenant not found: {tenant}")]
    TenantNotFound { tenant: TenantId },

    /// Connectivity failure reaching the tenant's data store.
    #[error("tenant registry unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by [`crate::ContextSnapshotClient`].
#[derive(Debug, Error)]
pub enum ContextStoreError {
    #[error("tenant not found: {tenant}")]
    TenantNotFound { tenant: TenantId },

    #[error("principal '{principal}' not found in tenant '{tenant}'")]
    PrincipalNotFound { tenant: TenantId, principal: String },

    /// Connectivity failure reaching the tenant's data store.
    #[error("context store unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure while reading an entitlement flag.
#[derive(Debug, Error)]
pub enum EntitlementError {
    #[error("tenant not found: {tenant}")]
    TenantNotFound { tenant: TenantId },

    #[error("entitlement lookup unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

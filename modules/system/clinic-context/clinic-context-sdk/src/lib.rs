//! Clinic Context SDK
//!
//! Interfaces the gateway's context pipeline consumes from the rest of the platform:
//!
//! - [`TokenIntrospectionClient`] - turns an already-validated bearer token into a principal
//! - [`TenantRegistryClient`] - reads a tenant's registry entries for the database cross-check
//! - [`ContextSnapshotClient`] - loads a principal's permission snapshot from the tenant store
//! - [`ModuleEntitlementClient`] - per-tenant API enablement flags
//!
//! ## Usage
//!
//! ```ignore
//! use clinic_context_sdk::TenantRegistryClient;
//!
//! let entries = registry.registry_entries(&tenant).await?;
//! let db = clinic_context_sdk::authoritative_database_entry(&entries);
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::{
    ContextSnapshotClient, ModuleEntitlementClient, TenantRegistryClient,
    TokenIntrospectionClient,
};
pub use error::{ContextStoreError, EntitlementError, TenantRegistryError, TokenIntrospectionError};
pub use models::{AuthenticatedToken, RegistryEntry, RegistryEntryKind, authoritative_database_entry};

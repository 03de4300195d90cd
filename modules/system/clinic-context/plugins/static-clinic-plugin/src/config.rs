//! Configuration for the static clinic context plugin.

use std::collections::{BTreeMap, BTreeSet};

use carebridge_security::{Principal, TenantId};
use clinic_context_sdk::RegistryEntry;
use serde::{Deserialize, Serialize};

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticClinicPluginConfig {
    /// Static token-to-principal mappings.
    pub tokens: Vec<TokenMapping>,

    /// Known tenants with their registry, entitlements and principal permissions.
    pub tenants: Vec<TenantConfig>,

    /// Tenant that answers for the empty tenant id of single-tenant deployments.
    /// Defaults to the only configured tenant when exactly one is configured.
    pub single_tenant: Option<TenantId>,
}

/// Maps a static bearer token to a principal.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TokenMapping {
    /// The bearer token value to match. Never serialized back out.
    #[serde(skip_serializing)]
    pub token: String,
    /// The principal to return when this token is presented.
    pub principal: Principal,
    /// Resource identifiers the token was issued for.
    #[serde(default)]
    pub resource_ids: Vec<String>,
    /// Extension claims bound inside the token (e.g. the federated tenant claim).
    #[serde(default)]
    pub extensions: BTreeMap<String, String>,
}

/// One tenant (clinic) and its backing store contents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    pub id: TenantId,

    /// Registry table rows, in storage order.
    #[serde(default)]
    pub registry: Vec<RegistryEntry>,

    #[serde(default)]
    pub patient_api_enabled: bool,

    #[serde(default)]
    pub provider_api_enabled: bool,

    /// Per-principal permissions, keyed by principal id.
    #[serde(default)]
    pub principals: BTreeMap<String, PermissionConfig>,

    /// Permissions for principals without an explicit entry. Unknown principals are
    /// rejected when this is absent.
    #[serde(default)]
    pub default_permissions: Option<PermissionConfig>,
}

/// Permission data a snapshot is built from.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionConfig {
    pub roles: BTreeSet<String>,
    pub features: BTreeMap<String, bool>,
    pub provider_ids: Vec<String>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

use serde::{Deserialize, Serialize};

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_owned()
}

fn default_require_auth_by_default() -> bool {
    true
}

fn default_body_limit_bytes() -> usize {
    16 * 1024 * 1024
}

/// API gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiGatewayConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// If true, routes that are not listed in `public_routes` require a bearer token.
    #[serde(default = "default_require_auth_by_default")]
    pub require_auth_by_default: bool,

    /// Routes reachable without a bearer token. `/health` is always public.
    #[serde(default)]
    pub public_routes: Vec<RouteConfig>,

    /// Global request body size limit in bytes
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,

    #[serde(default)]
    pub tenancy: TenancyConfig,

    #[serde(default)]
    pub params: ParamNames,

    #[serde(default)]
    pub federated: FederatedConfig,

    #[serde(default)]
    pub module_gate: ModuleGateConfig,
}

impl Default for ApiGatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            require_auth_by_default: default_require_auth_by_default(),
            public_routes: Vec::new(),
            body_limit_bytes: default_body_limit_bytes(),
            tenancy: TenancyConfig::default(),
            params: ParamNames::default(),
            federated: FederatedConfig::default(),
            module_gate: ModuleGateConfig::default(),
        }
    }
}

/// A `(method, path)` pair. Paths accept both `{id}` and `:id` parameter syntax.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub method: String,
    pub path: String,
}

/// Deployment tenancy mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct TenancyConfig {
    /// Multi-tenant deployment. When false every request resolves the empty tenant and the
    /// registry check never runs.
    pub require_tenant: bool,

    /// Cross-check the caller's database UUID against the tenant registry.
    pub require_database_uuid: bool,

    /// Tokens issued for any of these resource identifiers skip the registry check.
    pub trusted_resource_ids: Vec<String>,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            require_tenant: true,
            require_database_uuid: true,
            trusted_resource_ids: Vec::new(),
        }
    }
}

impl TenancyConfig {
    /// Whether the registry check applies to this deployment at all.
    #[must_use]
    pub fn verifies_database_uuid(&self) -> bool {
        self.require_tenant && self.require_database_uuid
    }
}

/// Query parameter names the pipeline reads.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ParamNames {
    pub tenant: String,
    pub database_uuid: String,
}

impl Default for ParamNames {
    fn default() -> Self {
        Self {
            tenant: "tenant".to_owned(),
            database_uuid: "database_uuid".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FederatedConfig {
    /// Token extension claim carrying the tenant of a federated caller.
    pub tenant_claim: String,
}

impl Default for FederatedConfig {
    fn default() -> Self {
        Self {
            tenant_claim: "tenant".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ModuleGateConfig {
    /// Scope that bypasses the per-tenant API entitlement flags.
    pub override_scope: String,
}

impl Default for ModuleGateConfig {
    fn default() -> Self {
        Self {
            override_scope: "implicit-external-access".to_owned(),
        }
    }
}

//! Service implementation for the static clinic context plugin.

use std::collections::HashMap;

use carebridge_security::{ContextSnapshot, Principal, TenantId};
use clinic_context_sdk::{AuthenticatedToken, ContextStoreError, RegistryEntry};

use crate::config::{PermissionConfig, StaticClinicPluginConfig, TenantConfig, TokenMapping};

/// Static clinic context service.
///
/// Serves tokens, tenant registries, permissions and entitlements straight from
/// configuration. Every lookup reads the in-memory tables, so nothing is cached per
/// principal between calls.
pub struct Service {
    tokens: HashMap<String, TokenMapping>,
    tenants: HashMap<TenantId, TenantConfig>,
    single_tenant: Option<TenantId>,
}

impl Service {
    /// Create a service from plugin configuration. Later duplicates win.
    #[must_use]
    pub fn from_config(cfg: &StaticClinicPluginConfig) -> Self {
        let tokens = cfg
            .tokens
            .iter()
            .map(|m| (m.token.clone(), m.clone()))
            .collect();
        let tenants = cfg
            .tenants
            .iter()
            .map(|t| (t.id.clone(), t.clone()))
            .collect();
        let single_tenant = cfg.single_tenant.clone().or_else(|| match cfg.tenants.as_slice() {
            [only] => Some(only.id.clone()),
            _ => None,
        });

        Self {
            tokens,
            tenants,
            single_tenant,
        }
    }

    /// Returns `None` for empty or unknown tokens.
    #[must_use]
    pub fn introspect(&self, bearer_token: &str) -> Option<AuthenticatedToken> {
        if bearer_token.is_empty() {
            return None;
        }
        let mapping = self.tokens.get(bearer_token)?;

        Some(AuthenticatedToken {
            principal: mapping.principal.clone(),
            resource_ids: mapping.resource_ids.clone(),
            extensions: mapping.extensions.clone(),
            bearer_token: bearer_token.to_owned(),
        })
    }

    /// The empty tenant id resolves to the single-tenant entry unless a tenant is
    /// configured under the empty id itself.
    #[must_use]
    pub fn tenant(&self, tenant: &TenantId) -> Option<&TenantConfig> {
        self.tenants.get(tenant).or_else(|| {
            if tenant.is_empty() {
                self.single_tenant.as_ref().and_then(|id| self.tenants.get(id))
            } else {
                None
            }
        })
    }

    #[must_use]
    pub fn registry_entries(&self, tenant: &TenantId) -> Option<Vec<RegistryEntry>> {
        self.tenant(tenant).map(|t| t.registry.clone())
    }

    /// Build a snapshot for `principal` in `tenant`.
    ///
    /// # Errors
    /// - `TenantNotFound` for an unknown tenant
    /// - `PrincipalNotFound` for an unknown principal when no default permissions are set
    pub fn snapshot(
        &self,
        tenant: &TenantId,
        principal: &Principal,
    ) -> Result<ContextSnapshot, ContextStoreError> {
        let cfg = self
            .tenant(tenant)
            .ok_or_else(|| ContextStoreError::TenantNotFound {
                tenant: tenant.clone(),
            })?;
        let permissions = cfg
            .principals
            .get(principal.id())
            .or(cfg.default_permissions.as_ref())
            .ok_or_else(|| ContextStoreError::PrincipalNotFound {
                tenant: tenant.clone(),
                principal: principal.id().to_owned(),
            })?;

        Ok(build_snapshot(permissions, cfg.provider_api_enabled))
    }
}

fn build_snapshot(permissions: &PermissionConfig, provider_api_enabled: bool) -> ContextSnapshot {
    let mut builder = ContextSnapshot::builder()
        .provider_ids(permissions.provider_ids.clone())
        .provider_api_enabled(provider_api_enabled);
    for role in &permissions.roles {
        builder = builder.role(role.clone());
    }
    for (name, enabled) in &permissions.features {
        builder = builder.feature(name.clone(), *enabled);
    }
    for (key, value) in &permissions.attributes {
        builder = builder.attribute(key.clone(), value.clone());
    }
    builder.build()
}

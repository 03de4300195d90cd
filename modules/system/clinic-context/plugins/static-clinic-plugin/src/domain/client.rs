//! Client implementations for the static clinic context plugin.
//!
//! Implements every clinic context SDK trait using the domain service.

use async_trait::async_trait;
use carebridge_security::{ContextSnapshot, Principal, TenantId};
use clinic_context_sdk::{
    AuthenticatedToken, ContextSnapshotClient, ContextStoreError, EntitlementError,
    ModuleEntitlementClient, RegistryEntry, TenantRegistryClient, TenantRegistryError,
    TokenIntrospectionClient, TokenIntrospectionError,
};

use super::service::Service;

#[async_trait]
impl TokenIntrospectionClient for Service {
    async fn introspect(
        &self,
        bearer_token: &str,
    ) -> Result<AuthenticatedToken, TokenIntrospectionError> {
        self.introspect(bearer_token)
            .ok_or_else(|| TokenIntrospectionError::Unauthorized("unknown token".to_owned()))
    }
}

#[async_trait]
impl TenantRegistryClient for Service {
    async fn registry_entries(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RegistryEntry>, TenantRegistryError> {
        self.registry_entries(tenant)
            .ok_or_else(|| TenantRegistryError::TenantNotFound {
                tenant: tenant.clone(),
            })
    }
}

#[async_trait]
impl ContextSnapshotClient for Service {
    async fn load_snapshot(
        &self,
        tenant: &TenantId,
        principal: &Principal,
    ) -> Result<ContextSnapshot, ContextStoreError> {
        self.snapshot(tenant, principal)
    }
}

#[async_trait]
impl ModuleEntitlementClient for Service {
    async fn patient_api_enabled(&self, tenant: &TenantId) -> Result<bool, EntitlementError> {
        self.tenant(tenant)
            .map(|t| t.patient_api_enabled)
            .ok_or_else(|| EntitlementError::TenantNotFound {
                tenant: tenant.clone(),
            })
    }
}

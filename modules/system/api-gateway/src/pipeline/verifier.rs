use std::{collections::HashSet, sync::Arc};

use carebridge_security::{Principal, TenantId};
use clinic_context_sdk::{AuthenticatedToken, TenantRegistryClient, authoritative_database_entry};
use uuid::Uuid;

use super::params::RequestParams;
use crate::config::TenancyConfig;
use crate::error::{
    DATABASE_UUID_INVALID, DATABASE_UUID_MISMATCH, DATABASE_UUID_MISSING, GatewayError,
    TENANT_MISSING,
};

/// Outcome of a successful registry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The caller's database UUID matched the tenant's authoritative registry entry.
    Verified,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The deployment does not cross-check database UUIDs.
    NotRequired,
    /// Federated tokens bind their tenant at issue time.
    FederatedPrincipal,
    /// The token was issued for a configured trusted resource.
    TrustedResource,
}

/// Confirms that the resolved tenant and the caller's database UUID name the same store.
pub struct RegistryVerifier {
    registry: Arc<dyn TenantRegistryClient>,
    required: bool,
    trusted_resource_ids: HashSet<String>,
}

impl RegistryVerifier {
    #[must_use]
    pub fn new(registry: Arc<dyn TenantRegistryClient>, tenancy: &TenancyConfig) -> Self {
        Self {
            registry,
            required: tenancy.verifies_database_uuid(),
            trusted_resource_ids: tenancy.trusted_resource_ids.iter().cloned().collect(),
        }
    }

    /// Run the registry check for one request.
    ///
    /// The registry is read live on every call. The caller's UUID is parsed and compared
    /// by value against the first `Database` entry of the tenant's registry.
    ///
    /// # Errors
    /// - 400 when the tenant or UUID parameter is missing, unparseable, or mismatched
    /// - tenant misconfiguration when the registry is empty or the tenant is unknown
    /// - registry transport failures, unchanged
    pub async fn verify(
        &self,
        token: &AuthenticatedToken,
        tenant: &TenantId,
        params: &RequestParams,
    ) -> Result<Verification, GatewayError> {
        if !self.required {
            return Ok(Verification::Skipped(SkipReason::NotRequired));
        }

        match &token.principal {
            Principal::FederatedUser(_) => {
                return Ok(Verification::Skipped(SkipReason::FederatedPrincipal));
            }
            Principal::ResourceOwnerUser(_)
            | Principal::PatientUser { .. }
            | Principal::ClientCredential(_) => {}
        }

        if let Some(resource) = token
            .resource_ids
            .iter()
            .find(|r| self.trusted_resource_ids.contains(*r))
        {
            tracing::debug!(%resource, "Token issued for trusted resource, skipping registry check");
            return Ok(Verification::Skipped(SkipReason::TrustedResource));
        }

        if tenant.is_empty() {
            return Err(GatewayError::bad_request(TENANT_MISSING));
        }
        let Some(raw_uuid) = params.database_uuid.as_deref() else {
            return Err(GatewayError::bad_request(DATABASE_UUID_MISSING));
        };

        let entries = self.registry.registry_entries(tenant).await?;
        let Some(entry) = authoritative_database_entry(&entries) else {
            return Err(GatewayError::TenantMisconfigured(format!(
                "tenant '{tenant}' has no database registry entry"
            )));
        };

        let presented = Uuid::parse_str(raw_uuid.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Database uuid parameter is not a UUID");
            GatewayError::bad_request(DATABASE_UUID_INVALID)
        })?;

        if presented.as_bytes() != entry.uuid.as_bytes() {
            tracing::debug!(
                tenant_id = %tenant,
                presented = %presented,
                "Database uuid does not match tenant registry"
            );
            return Err(GatewayError::bad_request(DATABASE_UUID_MISMATCH));
        }

        Ok(Verification::Verified)
    }
}

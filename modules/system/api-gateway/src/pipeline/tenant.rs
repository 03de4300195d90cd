use carebridge_security::{Principal, TenantId};
use clinic_context_sdk::AuthenticatedToken;

use super::params::RequestParams;
use crate::config::ApiGatewayConfig;
use crate::error::{GatewayError, TENANT_MISSING};

/// Resolve the tenant a request runs against.
///
/// Federated callers carry the tenant as a token extension claim and are trusted without
/// lookup. Client-credential callers must name it as a query parameter. User principals
/// carry it themselves. Single-tenant deployments always resolve the empty tenant.
///
/// # Errors
/// Returns a 400 rejection when tenancy is required and no tenant can be resolved.
pub fn resolve_tenant(
    cfg: &ApiGatewayConfig,
    token: &AuthenticatedToken,
    params: &RequestParams,
) -> Result<TenantId, GatewayError> {
    if !cfg.tenancy.require_tenant {
        return Ok(TenantId::empty());
    }

    let resolved = match &token.principal {
        Principal::FederatedUser(_) => {
            TenantId::parse_optional(token.extension(&cfg.federated.tenant_claim))
        }
        Principal::ClientCredential(_) => TenantId::parse_optional(params.tenant.as_deref()),
        Principal::ResourceOwnerUser(_) | Principal::PatientUser { .. } => token
            .principal
            .embedded_tenant()
            .filter(|t| !t.is_empty())
            .cloned(),
    };

    resolved.ok_or_else(|| GatewayError::bad_request(TENANT_MISSING))
}

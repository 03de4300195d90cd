use std::sync::Arc;

use carebridge_security::{Principal, SecurityContext};
use clinic_context_sdk::ModuleEntitlementClient;

use crate::error::{GatewayError, SERVICE_NOT_ENABLED};

/// Checks that the tenant has the REST API enabled for the caller's audience.
pub struct ModuleGate {
    entitlements: Arc<dyn ModuleEntitlementClient>,
    override_scope: String,
}

impl ModuleGate {
    #[must_use]
    pub fn new(entitlements: Arc<dyn ModuleEntitlementClient>, override_scope: String) -> Self {
        Self {
            entitlements,
            override_scope,
        }
    }

    /// Patients are checked against the tenant's patient API flag, everyone else against
    /// the provider API flag in the snapshot. The override scope skips both.
    ///
    /// # Errors
    /// - 403 when the relevant API is disabled for the tenant
    /// - a server error when the entitlement lookup itself fails
    pub async fn check(&self, context: &SecurityContext) -> Result<(), GatewayError> {
        if context.has_scope(&self.override_scope) {
            tracing::debug!(scope = %self.override_scope, "Module gate bypassed by override scope");
            return Ok(());
        }

        let enabled = match context.principal() {
            Principal::PatientUser { .. } => {
                self.entitlements
                    .patient_api_enabled(context.tenant_id())
                    .await?
            }
            Principal::ResourceOwnerUser(_)
            | Principal::FederatedUser(_)
            | Principal::ClientCredential(_) => context.snapshot().provider_api_enabled(),
        };

        if enabled {
            Ok(())
        } else {
            Err(GatewayError::forbidden(SERVICE_NOT_ENABLED))
        }
    }
}

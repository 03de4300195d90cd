use std::collections::BTreeSet;

use secrecy::SecretString;

use crate::principal::{GrantType, Principal};
use crate::snapshot::ContextSnapshot;
use crate::tenant::TenantId;

/// `SecurityContext` is the verified, tenant-bound view of the caller for one request.
///
/// Built by the gateway's context loader after the tenant has been resolved and
/// cross-checked, then published through [`crate::SecurityContextHolder`] for the rest
/// of the request. Downstream code only ever reads it.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SecurityContext {
    /// Tenant whose data store the request targets. Empty in single-tenant deployments.
    tenant_id: TenantId,
    /// The authenticated caller.
    principal: Principal,
    /// Permissions and entitlements loaded for this request.
    snapshot: ContextSnapshot,
    /// Scopes active for this request.
    scopes: BTreeSet<String>,
    /// Original bearer token for forwarding to downstream services. Never serialized.
    /// Wrapped in `SecretString` so `Debug` redacts the value automatically.
    #[serde(skip)]
    bearer_token: Option<SecretString>,
}

impl SecurityContext {
    /// Start building a context for `principal`.
    ///
    /// Active scopes default to the scopes granted to the principal.
    #[must_use]
    pub fn builder(principal: Principal) -> SecurityContextBuilder {
        SecurityContextBuilder {
            scopes: principal.scopes().clone(),
            principal,
            tenant_id: TenantId::empty(),
            snapshot: ContextSnapshot::default(),
            bearer_token: None,
        }
    }

    #[must_use]
    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn scopes(&self) -> &BTreeSet<String> {
        &self.scopes
    }

    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    #[must_use]
    pub fn grant_type(&self) -> GrantType {
        self.principal.grant_type()
    }

    #[must_use]
    pub fn patient_id(&self) -> Option<&str> {
        self.principal.patient_id()
    }

    #[must_use]
    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }
}

pub struct SecurityContextBuilder {
    principal: Principal,
    tenant_id: TenantId,
    snapshot: ContextSnapshot,
    scopes: BTreeSet<String>,
    bearer_token: Option<SecretString>,
}

impl SecurityContextBuilder {
    #[must_use]
    pub fn tenant_id(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    #[must_use]
    pub fn snapshot(mut self, snapshot: ContextSnapshot) -> Self {
        self.snapshot = snapshot;
        self
    }

    #[must_use]
    pub fn scopes(mut self, scopes: BTreeSet<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn bearer_token(mut self, token: impl Into<SecretString>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SecurityContext {
        SecurityContext {
            tenant_id: self.tenant_id,
            principal: self.principal,
            snapshot: self.snapshot,
            scopes: self.scopes,
            bearer_token: self.bearer_token,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;
    use crate::principal::PrincipalClaims;

    fn staff() -> Principal {
        Principal::ResourceOwnerUser(
            PrincipalClaims::new("nurse.joy")
                .with_tenant("clinicA")
                .with_scopes(["read"]),
        )
    }

    #[test]
    fn builder_full() {
        let snapshot = ContextSnapshot::builder().role("nurse").build();

        let ctx = SecurityContext::builder(staff())
            .tenant_id(TenantId::new("clinicA"))
            .snapshot(snapshot.clone())
            .bearer_token("token-123".to_owned())
            .build();

        assert_eq!(ctx.tenant_id().as_str(), "clinicA");
        assert_eq!(ctx.principal().id(), "nurse.joy");
        assert_eq!(ctx.snapshot(), &snapshot);
        assert!(ctx.has_scope("read"));
        assert_eq!(ctx.grant_type(), GrantType::ResourceOwner);
        assert_eq!(
            ctx.bearer_token().map(ExposeSecret::expose_secret),
            Some("token-123")
        );
    }

    #[test]
    fn builder_minimal_uses_principal_scopes_and_empty_tenant() {
        let ctx = SecurityContext::builder(staff()).build();

        assert!(ctx.tenant_id().is_empty());
        assert_eq!(ctx.scopes(), staff().scopes());
        assert!(ctx.bearer_token().is_none());
        assert_eq!(ctx.patient_id(), None);
    }

    #[test]
    fn explicit_scopes_override_principal_scopes() {
        let ctx = SecurityContext::builder(staff())
            .scopes(BTreeSet::from(["admin".to_owned()]))
            .build();

        assert!(ctx.has_scope("admin"));
        assert!(!ctx.has_scope("read"));
    }

    #[test]
    fn bearer_token_not_serialized() {
        let ctx = SecurityContext::builder(staff())
            .bearer_token("secret-token".to_owned())
            .build();

        let serialized = serde_json::to_string(&ctx).unwrap();
        assert!(!serialized.contains("secret-token"));
        assert!(!serialized.contains("bearer_token"));
    }

    #[test]
    fn debug_redacts_bearer_token() {
        let ctx = SecurityContext::builder(staff())
            .bearer_token("secret-token".to_owned())
            .build();

        assert!(!format!("{ctx:?}").contains("secret-token"));
    }
}

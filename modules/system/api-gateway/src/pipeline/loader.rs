use std::{future::Future, sync::Arc};

use carebridge_security::{SecurityContext, SecurityContextHolder, TenantId};
use clinic_context_sdk::{AuthenticatedToken, ContextSnapshotClient};
use tracing::Instrument;

use crate::error::GatewayError;

/// Builds the request's security context and publishes it for downstream code.
pub struct ContextLoader {
    snapshots: Arc<dyn ContextSnapshotClient>,
}

impl ContextLoader {
    #[must_use]
    pub fn new(snapshots: Arc<dyn ContextSnapshotClient>) -> Self {
        Self { snapshots }
    }

    /// Fetch the principal's snapshot from the tenant store and assemble the context.
    ///
    /// Exactly one store read per call; nothing is cached between requests.
    ///
    /// # Errors
    /// Propagates context store failures.
    pub async fn load(
        &self,
        token: &AuthenticatedToken,
        tenant: TenantId,
    ) -> Result<SecurityContext, GatewayError> {
        let snapshot = self
            .snapshots
            .load_snapshot(&tenant, &token.principal)
            .await?;

        Ok(SecurityContext::builder(token.principal.clone())
            .tenant_id(tenant)
            .snapshot(snapshot)
            .bearer_token(token.bearer_token.clone())
            .build())
    }

    /// Run `fut` with `context` active in the holder.
    ///
    /// The context ends when `fut` completes, errors, panics, or is dropped. The current
    /// span gets the tenant recorded and `fut` runs inside a `request_context` span.
    pub async fn publish<F>(context: SecurityContext, fut: F) -> F::Output
    where
        F: Future,
    {
        let tenant_id = context.tenant_id().clone();
        tracing::Span::current().record("tenant_id", tracing::field::display(&tenant_id));
        let span = tracing::info_span!(
            "request_context",
            tenant_id = %tenant_id,
            principal_kind = context.principal().kind().as_str(),
            grant_type = context.grant_type().as_str(),
        );

        SecurityContextHolder::scope(context, fut)
            .instrument(span)
            .await
    }
}

//! The per-request authorization context pipeline.
//!
//! For a request carrying a bearer credential the stages run strictly in order:
//! introspect → resolve tenant → verify registry → load context → gate. A stage never
//! runs after an earlier one rejected the request. The gate and everything downstream run
//! inside the holder scope opened by the loader, so the context ends on every exit path.

mod gate;
mod loader;
mod params;
mod tenant;
mod verifier;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::{IntoResponse, Response},
};
use carebridge_security::{SecurityContext, SecurityContextHolder};
use clinic_context_sdk::{
    ContextSnapshotClient, ModuleEntitlementClient, TenantRegistryClient, TokenIntrospectionClient,
};

pub use gate::ModuleGate;
pub use loader::ContextLoader;
pub use params::RequestParams;
pub use tenant::resolve_tenant;
pub use verifier::{RegistryVerifier, SkipReason, Verification};

use crate::auth::{
    AuthRequirement, GatewayRoutePolicy, extract_bearer_token, is_preflight_request,
};
use crate::config::ApiGatewayConfig;
use crate::error::{AUTHENTICATION_REQUIRED, GatewayError};

/// The four backing collaborators the pipeline calls out to.
#[derive(Clone)]
pub struct ClinicClients {
    pub tokens: Arc<dyn TokenIntrospectionClient>,
    pub registry: Arc<dyn TenantRegistryClient>,
    pub snapshots: Arc<dyn ContextSnapshotClient>,
    pub entitlements: Arc<dyn ModuleEntitlementClient>,
}

impl ClinicClients {
    /// Use one backend for every collaborator.
    #[must_use]
    pub fn from_backend<T>(backend: Arc<T>) -> Self
    where
        T: TokenIntrospectionClient
            + TenantRegistryClient
            + ContextSnapshotClient
            + ModuleEntitlementClient
            + 'static,
    {
        Self {
            tokens: backend.clone(),
            registry: backend.clone(),
            snapshots: backend.clone(),
            entitlements: backend,
        }
    }
}

/// Shared state of [`context_pipeline_middleware`].
pub struct ContextPipeline {
    config: ApiGatewayConfig,
    route_policy: GatewayRoutePolicy,
    tokens: Arc<dyn TokenIntrospectionClient>,
    verifier: RegistryVerifier,
    loader: ContextLoader,
    gate: ModuleGate,
}

impl ContextPipeline {
    #[must_use]
    pub fn new(
        config: ApiGatewayConfig,
        route_policy: GatewayRoutePolicy,
        clients: ClinicClients,
    ) -> Self {
        let verifier = RegistryVerifier::new(clients.registry, &config.tenancy);
        let loader = ContextLoader::new(clients.snapshots);
        let gate = ModuleGate::new(
            clients.entitlements,
            config.module_gate.override_scope.clone(),
        );

        Self {
            config,
            route_policy,
            tokens: clients.tokens,
            verifier,
            loader,
            gate,
        }
    }

    /// Run introspection, tenant resolution, registry verification and context loading.
    ///
    /// # Errors
    /// Returns the first stage failure.
    pub async fn establish(
        &self,
        bearer_token: &str,
        uri: &Uri,
    ) -> Result<SecurityContext, GatewayError> {
        let token = self.tokens.introspect(bearer_token).await?;
        let params = RequestParams::from_uri(uri, &self.config.params);

        let tenant = resolve_tenant(&self.config, &token, &params)?;
        let verification = self.verifier.verify(&token, &tenant, &params).await?;
        tracing::debug!(
            tenant_id = %tenant,
            principal_kind = token.principal.kind().as_str(),
            ?verification,
            "Tenant resolved"
        );

        self.loader.load(&token, tenant).await
    }

    /// Gate the request and run the rest of the stack with `context` active.
    async fn run_in_context(
        self: Arc<Self>,
        context: SecurityContext,
        req: Request,
        next: Next,
    ) -> Response {
        ContextLoader::publish(context, async move {
            let context = match SecurityContextHolder::current() {
                Ok(ctx) => ctx,
                Err(err) => return GatewayError::from(err).into_response(),
            };
            if let Err(err) = self.gate.check(&context).await {
                return err.into_response();
            }
            next.run(req).await
        })
        .await
    }
}

/// Axum middleware running the authorization context pipeline.
///
/// Requests without a bearer credential pass through anonymously on public routes and are
/// rejected with 401 on authenticated ones. CORS preflight always passes through.
pub async fn context_pipeline_middleware(
    State(pipeline): State<Arc<ContextPipeline>>,
    req: Request,
    next: Next,
) -> Response {
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }

    let Some(bearer_token) = extract_bearer_token(req.headers()).map(str::to_owned) else {
        return match pipeline.route_policy.resolve(req.method(), req.uri().path()) {
            AuthRequirement::None => next.run(req).await,
            AuthRequirement::Required => {
                GatewayError::unauthorized(AUTHENTICATION_REQUIRED).into_response()
            }
        };
    };

    let established = pipeline.establish(&bearer_token, req.uri()).await;
    match established {
        Ok(context) => pipeline.run_in_context(context, req, next).await,
        Err(err) => err.into_response(),
    }
}

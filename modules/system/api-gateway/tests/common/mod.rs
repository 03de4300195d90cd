#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Shared test doubles and request helpers for the gateway integration tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use api_gateway::{ApiGatewayConfig, ClinicClients, ErrorBody, build_router};
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
    routing::get,
};
use carebridge_security::{
    ContextSnapshot, Principal, PrincipalClaims, SecurityContext, SecurityContextHolder,
    TenantId,
};
use clinic_context_sdk::{
    AuthenticatedToken, ContextSnapshotClient, ContextStoreError, EntitlementError,
    ModuleEntitlementClient, RegistryEntry, TenantRegistryClient, TenantRegistryError,
    TokenIntrospectionClient, TokenIntrospectionError,
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

pub const CLINIC_A_DB: &str = "11111111-1111-1111-1111-111111111111";
pub const OTHER_DB: &str = "22222222-2222-2222-2222-222222222222";

pub const STAFF_TOKEN: &str = "staff-token";
pub const PATIENT_TOKEN: &str = "patient-token";
pub const PORTAL_PATIENT_TOKEN: &str = "portal-patient-token";
pub const SERVICE_TOKEN: &str = "service-token";
pub const FEDERATED_TOKEN: &str = "federated-token";
pub const PARTNER_TOKEN: &str = "partner-token";
pub const PARTNER_RESOURCE: &str = "partner-api";

/// How the registry double answers.
#[derive(Clone)]
pub enum RegistryBehavior {
    Entries(Vec<RegistryEntry>),
    Unavailable(&'static str),
}

/// In-memory stand-in for every collaborator, counting calls per stage.
pub struct TestBackend {
    tokens: HashMap<String, AuthenticatedToken>,
    registry: HashMap<TenantId, RegistryBehavior>,
    provider_api_enabled: bool,
    patient_api_enabled: bool,
    pub introspections: AtomicUsize,
    pub registry_lookups: AtomicUsize,
    pub snapshot_loads: AtomicUsize,
    pub entitlement_checks: AtomicUsize,
}

impl TestBackend {
    pub fn new() -> Self {
        let mut tokens = HashMap::new();
        let mut add = |token: &str, principal: Principal| {
            tokens.insert(token.to_owned(), AuthenticatedToken::new(principal, token));
        };

        add(
            STAFF_TOKEN,
            Principal::ResourceOwnerUser(
                PrincipalClaims::new("dr.house")
                    .with_tenant("clinicA")
                    .with_scopes(["clinical.read"]),
            ),
        );
        add(
            PATIENT_TOKEN,
            Principal::PatientUser {
                claims: PrincipalClaims::new("jane").with_tenant("clinicA"),
                patient_id: "p-7".to_owned(),
            },
        );
        add(
            PORTAL_PATIENT_TOKEN,
            Principal::PatientUser {
                claims: PrincipalClaims::new("jane")
                    .with_tenant("clinicA")
                    .with_scopes(["implicit-external-access"]),
                patient_id: "p-7".to_owned(),
            },
        );
        add(
            SERVICE_TOKEN,
            Principal::ClientCredential(PrincipalClaims::new("lab-system")),
        );
        add(
            FEDERATED_TOKEN,
            Principal::FederatedUser(PrincipalClaims::new("partner-user")),
        );
        add(
            PARTNER_TOKEN,
            Principal::ResourceOwnerUser(PrincipalClaims::new("partner.staff").with_tenant("clinicA")),
        );
        if let Some(federated) = tokens.get_mut(FEDERATED_TOKEN) {
            federated
                .extensions
                .insert("tenant".to_owned(), "clinicF".to_owned());
        }
        if let Some(partner) = tokens.get_mut(PARTNER_TOKEN) {
            partner.resource_ids = vec![PARTNER_RESOURCE.to_owned()];
        }

        let mut registry = HashMap::new();
        registry.insert(
            TenantId::new("clinicA"),
            RegistryBehavior::Entries(vec![RegistryEntry::database(
                Uuid::parse_str(CLINIC_A_DB).unwrap(),
            )]),
        );
        registry.insert(TenantId::new("clinicEmpty"), RegistryBehavior::Entries(Vec::new()));

        Self {
            tokens,
            registry,
            provider_api_enabled: true,
            patient_api_enabled: true,
            introspections: AtomicUsize::new(0),
            registry_lookups: AtomicUsize::new(0),
            snapshot_loads: AtomicUsize::new(0),
            entitlement_checks: AtomicUsize::new(0),
        }
    }

    pub fn with_registry(mut self, tenant: &str, behavior: RegistryBehavior) -> Self {
        self.registry.insert(TenantId::new(tenant), behavior);
        self
    }

    pub fn with_patient_api(mut self, enabled: bool) -> Self {
        self.patient_api_enabled = enabled;
        self
    }

    pub fn with_provider_api(mut self, enabled: bool) -> Self {
        self.provider_api_enabled = enabled;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenIntrospectionClient for TestBackend {
    async fn introspect(
        &self,
        bearer_token: &str,
    ) -> Result<AuthenticatedToken, TokenIntrospectionError> {
        self.introspections.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(bearer_token)
            .cloned()
            .ok_or_else(|| TokenIntrospectionError::Unauthorized("unknown token".to_owned()))
    }
}

#[async_trait]
impl TenantRegistryClient for TestBackend {
    async fn registry_entries(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<RegistryEntry>, TenantRegistryError> {
        self.registry_lookups.fetch_add(1, Ordering::SeqCst);
        match self.registry.get(tenant) {
            Some(RegistryBehavior::Entries(entries)) => Ok(entries.clone()),
            Some(RegistryBehavior::Unavailable(cause)) => {
                Err(TenantRegistryError::Unavailable((*cause).to_owned()))
            }
            None => Err(TenantRegistryError::TenantNotFound {
                tenant: tenant.clone(),
            }),
        }
    }
}

#[async_trait]
impl ContextSnapshotClient for TestBackend {
    async fn load_snapshot(
        &self,
        _tenant: &TenantId,
        principal: &Principal,
    ) -> Result<ContextSnapshot, ContextStoreError> {
        self.snapshot_loads.fetch_add(1, Ordering::SeqCst);
        let role = match principal {
            Principal::PatientUser { .. } => "patient",
            Principal::ResourceOwnerUser(_)
            | Principal::FederatedUser(_)
            | Principal::ClientCredential(_) => "staff",
        };
        Ok(ContextSnapshot::builder()
            .role(role)
            .provider_api_enabled(self.provider_api_enabled)
            .build())
    }
}

#[async_trait]
impl ModuleEntitlementClient for TestBackend {
    async fn patient_api_enabled(&self, _tenant: &TenantId) -> Result<bool, EntitlementError> {
        self.entitlement_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.patient_api_enabled)
    }
}

/// Business routes used by the tests.
pub fn test_routes() -> Router {
    Router::new()
        .route("/api/v1/records", get(records_handler))
        .route("/api/v1/failing", get(failing_handler))
        .route("/api/v1/panicking", get(panicking_handler))
        .route("/api/v1/nested", get(nested_context_handler))
        .route("/api/v1/audited", get(audited_handler))
        .route("/public/ping", get(ping_handler))
}

/// Reads the context twice; both reads must observe the same published instance.
async fn records_handler() -> Result<Json<Value>, api_gateway::GatewayError> {
    let first = SecurityContextHolder::current()?;
    tokio::task::yield_now().await;
    let second = SecurityContextHolder::current()?;

    Ok(Json(json!({
        "tenant_id": first.tenant_id().as_str(),
        "same_context": Arc::ptr_eq(&first, &second),
    })))
}

async fn failing_handler() -> Result<Json<Value>, api_gateway::GatewayError> {
    SecurityContextHolder::current()?;
    Err(anyhow::anyhow!("downstream report generator failed").into())
}

async fn panicking_handler() -> Json<Value> {
    assert!(SecurityContextHolder::is_active());
    panic!("handler blew up");
}

/// Starts a second context while the pipeline's context is still active.
async fn nested_context_handler() -> Json<Value> {
    let intruder = SecurityContext::builder(Principal::ClientCredential(PrincipalClaims::new(
        "intruder",
    )))
    .tenant_id(TenantId::new("clinicZ"))
    .build();

    SecurityContextHolder::scope(intruder, async { Json(json!({ "nested": true })) }).await
}

async fn audited_handler() -> Json<Value> {
    tracing::info!("Audit entry written");
    Json(json!({ "audited": true }))
}

async fn ping_handler() -> Json<Value> {
    Json(json!({ "context_active": SecurityContextHolder::is_active() }))
}

pub fn public_ping_config() -> ApiGatewayConfig {
    serde_json::from_value(json!({
        "public_routes": [{ "method": "GET", "path": "/public/ping" }]
    }))
    .unwrap()
}

pub fn router_with(config: &ApiGatewayConfig, backend: Arc<TestBackend>) -> Router {
    build_router(config, ClinicClients::from_backend(backend), test_routes()).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert a failure response: status, JSON content type and exact message.
pub async fn assert_error(response: Response, status: StatusCode, message: &str) {
    assert_eq!(response.status(), status);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(
        content_type.starts_with("application/json"),
        "unexpected content type: {content_type}"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body.message, message);
}

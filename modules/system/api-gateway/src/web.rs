use std::collections::BTreeSet;

use axum::Json;
use carebridge_security::TenantId;
use serde::Serialize;
use serde_json::{Value, json};

use crate::extract::CurrentContext;

pub const HEALTH_PATH: &str = "/health";
pub const CONTEXT_PATH: &str = "/api/v1/context";

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// What `GET /api/v1/context` reveals about the caller. The bearer token and snapshot
/// attributes stay server-side.
#[derive(Debug, Serialize)]
pub struct ContextView {
    pub tenant_id: TenantId,
    pub principal_kind: &'static str,
    pub principal_id: String,
    pub grant_type: &'static str,
    pub scopes: BTreeSet<String>,
    pub roles: BTreeSet<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

pub async fn context_view(ctx: CurrentContext) -> Json<ContextView> {
    Json(ContextView {
        tenant_id: ctx.tenant_id().clone(),
        principal_kind: ctx.principal().kind().as_str(),
        principal_id: ctx.principal().id().to_owned(),
        grant_type: ctx.grant_type().as_str(),
        scopes: ctx.scopes().clone(),
        roles: ctx.snapshot().roles().clone(),
        patient_id: ctx.patient_id().map(str::to_owned),
    })
}

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Static Clinic Context Plugin
//!
//! Serves every clinic context collaborator from configuration, for development,
//! end-to-end tests and single-node deployments without a platform backend.
//!
//! ## Configuration
//!
//! ```yaml
//! static_clinic:
//!   tokens:
//!     - token: "staff-token"
//!       principal:
//!         kind: resource_owner_user
//!         id: "dr.house"
//!         tenant_id: "clinicA"
//!         scopes: ["clinical.read"]
//!   tenants:
//!     - id: "clinicA"
//!       registry:
//!         - kind: database
//!           uuid: "11111111-1111-1111-1111-111111111111"
//!       patient_api_enabled: false
//!       provider_api_enabled: true
//!       principals:
//!         dr.house:
//!           roles: ["physician"]
//! ```

use std::sync::Arc;

pub mod config;
pub mod domain;

pub use config::StaticClinicPluginConfig;
pub use domain::Service;

/// Build the shared service and log what was loaded.
#[must_use]
pub fn build_service(cfg: &StaticClinicPluginConfig) -> Arc<Service> {
    tracing::info!(
        token_count = cfg.tokens.len(),
        tenant_count = cfg.tenants.len(),
        "Loaded static clinic plugin configuration"
    );
    if !cfg.tokens.is_empty() {
        tracing::warn!(
            "Static clinic plugin maps bearer tokens from configuration. \
             Do NOT use it in production."
        );
    }
    Arc::new(Service::from_config(cfg))
}

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! REST API gateway for clinic tenants.
//!
//! Every authenticated request runs through the context pipeline before reaching a
//! handler: the bearer token is introspected, the tenant resolved, the caller's database
//! UUID checked against the tenant registry, the security context loaded and published,
//! and the tenant's API entitlement gated. Handlers read the context through
//! [`CurrentContext`] or [`carebridge_security::SecurityContextHolder::current`].
//! Failures are rendered once, by [`GatewayError`], as `{"message": ...}` JSON.

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod pipeline;
pub mod router;
pub mod web;

pub use config::ApiGatewayConfig;
pub use error::{ErrorBody, GatewayError};
pub use extract::CurrentContext;
pub use pipeline::{ClinicClients, ContextPipeline, context_pipeline_middleware};
pub use router::{build_router, serve};

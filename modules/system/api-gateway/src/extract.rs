use std::{ops::Deref, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};
use carebridge_security::{SecurityContext, SecurityContextHolder};

use crate::error::GatewayError;

/// Handler access to the request's security context.
///
/// Rejects with the generic 500 body when no context is active, which only happens on a
/// route the pipeline let through anonymously.
#[derive(Debug, Clone)]
pub struct CurrentContext(pub Arc<SecurityContext>);

impl Deref for CurrentContext {
    type Target = SecurityContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CurrentContext
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(SecurityContextHolder::current()?))
    }
}

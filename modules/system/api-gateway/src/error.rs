//! Failure translation for the request pipeline.
//!
//! Every stage returns a [`GatewayError`]; the single [`IntoResponse`] impl below is the
//! only place the wire format is produced. Client-facing messages stay generic wherever
//! detail would reveal which tenants exist. The full cause is always logged.

use std::any::Any;
use std::borrow::Cow;

use axum::{
    Json,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use carebridge_security::NoActiveContext;
use clinic_context_sdk::{
    ContextStoreError, EntitlementError, TenantRegistryError, TokenIntrospectionError,
};
use serde::{Deserialize, Serialize};

pub const TENANT_MISSING: &str = "Required Tenant Id Parameter Missing.";
pub const DATABASE_UUID_MISSING: &str = "Required Database UUID Parameter Missing.";
pub const DATABASE_UUID_INVALID: &str = "Invalid database uuid parameter.";
pub const DATABASE_UUID_MISMATCH: &str = "database uuid does not match.";
pub const AUTHENTICATION_REQUIRED: &str =
    "Full authentication is required to access this resource.";
pub const INVALID_TOKEN: &str = "Invalid access token.";
pub const SERVICE_NOT_ENABLED: &str = "Rest API Service is not enabled for this client.";
pub const CLIENT_MISCONFIGURED: &str = "Client configuration error. Please contact support.";
pub const STORE_UNAVAILABLE: &str =
    "A temporary error occurred while reaching the data store. Please try again later.";
pub const UNEXPECTED: &str = "An unexpected error occurred. Please check your request parameters.";

/// Upper bound on a non-JSON error body read back by the normalization middleware.
const MAX_NORMALIZED_BODY_BYTES: usize = 8 * 1024;

/// Wire body of every failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

/// A request pipeline failure.
///
/// A stage rejection keeps its own status and message. Connectivity failures and tenant
/// misconfiguration get fixed messages. Everything else collapses into a generic 500.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A stage refused the request with a status and message meant for the caller.
    #[error("{status}: {message}")]
    Rejected {
        status: StatusCode,
        message: Cow<'static, str>,
    },

    /// A backing store could not be reached.
    #[error("data store unavailable: {0}")]
    StoreUnavailable(String),

    /// No data store is configured for the tenant, or its registry is empty.
    #[error("tenant misconfigured: {0}")]
    TenantMisconfigured(String),

    /// Context accessed outside of a request scope.
    #[error(transparent)]
    NoActiveContext(#[from] NoActiveContext),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl GatewayError {
    #[must_use]
    pub fn rejected(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<Cow<'static, str>>) -> Self {
        Self::rejected(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::rejected(StatusCode::UNAUTHORIZED, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
        Self::rejected(StatusCode::FORBIDDEN, message)
    }

    /// Status and client-facing message.
    #[must_use]
    pub fn classify(&self) -> (StatusCode, Cow<'static, str>) {
        match self {
            Self::Rejected { status, message } => (*status, message.clone()),
            Self::StoreUnavailable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Cow::Borrowed(STORE_UNAVAILABLE))
            }
            Self::TenantMisconfigured(_) => {
                (StatusCode::UNAUTHORIZED, Cow::Borrowed(CLIENT_MISCONFIGURED))
            }
            Self::NoActiveContext(_) | Self::Internal(_) | Self::Unexpected(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Cow::Borrowed(UNEXPECTED))
            }
        }
    }

    /// Log the original failure. Cognitive complexity is inflated by tracing macro expansion.
    #[allow(clippy::cognitive_complexity)]
    fn log(&self, status: StatusCode) {
        let status = status.as_u16();
        match self {
            Self::Rejected { message, .. } => {
                tracing::info!(status, reason = %message, "Request rejected");
            }
            Self::TenantMisconfigured(cause) => {
                tracing::warn!(status, %cause, "Tenant misconfigured");
            }
            Self::StoreUnavailable(cause) => {
                tracing::error!(status, %cause, "Data store unavailable");
            }
            Self::NoActiveContext(err) => {
                tracing::error!(status, error = %err, "Security context invariant violated");
            }
            Self::Internal(cause) => tracing::error!(status, %cause, "Internal error"),
            Self::Unexpected(err) => tracing::error!(status, error = ?err, "Unexpected error"),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, message) = self.classify();
        self.log(status);
        json_error(status, message.into_owned())
    }
}

fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { message })).into_response()
}

impl From<TokenIntrospectionError> for GatewayError {
    fn from(err: TokenIntrospectionError) -> Self {
        match err {
            TokenIntrospectionError::Unauthorized(reason) => {
                tracing::debug!(%reason, "Token introspection rejected the credential");
                Self::unauthorized(INVALID_TOKEN)
            }
            TokenIntrospectionError::Unavailable(msg) => Self::StoreUnavailable(msg),
            TokenIntrospectionError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<TenantRegistryError> for GatewayError {
    fn from(err: TenantRegistryError) -> Self {
        match err {
            TenantRegistryError::TenantNotFound { tenant } => {
                Self::TenantMisconfigured(format!("no registry for tenant '{tenant}'"))
            }
            TenantRegistryError::Unavailable(msg) => Self::StoreUnavailable(msg),
            TenantRegistryError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<ContextStoreError> for GatewayError {
    fn from(err: ContextStoreError) -> Self {
        match err {
            e @ (ContextStoreError::TenantNotFound { .. }
            | ContextStoreError::PrincipalNotFound { .. }) => {
                Self::TenantMisconfigured(e.to_string())
            }
            ContextStoreError::Unavailable(msg) => Self::StoreUnavailable(msg),
            ContextStoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// Entitlement lookups never surface as client errors: a missing tenant here is a server
/// fault, since earlier stages already accepted it.
impl From<EntitlementError> for GatewayError {
    fn from(err: EntitlementError) -> Self {
        match err {
            EntitlementError::Unavailable(msg) => Self::StoreUnavailable(msg),
            e @ (EntitlementError::TenantNotFound { .. } | EntitlementError::Internal(_)) => {
                Self::Internal(format!("entitlement check failed: {e}"))
            }
        }
    }
}

/// Rewrite any non-JSON error response produced further in into `{"message": ...}`.
///
/// Axum extractor rejections and the body limit layer answer with plain text; client
/// errors keep their text as the message, server errors get the generic message.
pub async fn error_normalization_middleware(req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_json(response.headers()) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let message = if status.is_server_error() {
        UNEXPECTED.to_owned()
    } else {
        match axum::body::to_bytes(body, MAX_NORMALIZED_BODY_BYTES).await {
            Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_owned(),
            _ => status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_owned(),
        }
    };
    tracing::debug!(status = status.as_u16(), %message, "Normalized non-JSON error response");

    let mut normalized = json_error(status, message);
    for (name, value) in &parts.headers {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            normalized.headers_mut().insert(name.clone(), value.clone());
        }
    }
    normalized
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Panic handler for `CatchPanicLayer`: a generic 500 body, the payload only in the log.
#[must_use]
#[allow(clippy::needless_pass_by_value)] // signature fixed by `ResponseForPanic`
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");

    let mut res = json_error(StatusCode::INTERNAL_SERVER_ERROR, UNEXPECTED.to_owned());
    res.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    res
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use carebridge_security::TenantId;

    #[test]
    fn rejection_keeps_status_and_message() {
        let (status, message) = GatewayError::bad_request(TENANT_MISSING).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(message, TENANT_MISSING);
    }

    #[test]
    fn registry_tenant_not_found_is_generic_unauthorized() {
        let err: GatewayError = TenantRegistryError::TenantNotFound {
            tenant: TenantId::new("clinicZ"),
        }
        .into();

        let (status, message) = err.classify();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(message, CLIENT_MISCONFIGURED);
        assert!(!message.contains("clinicZ"));
    }

    #[test]
    fn connectivity_failures_map_to_retry_message() {
        let errors: Vec<GatewayError> = vec![
            TenantRegistryError::Unavailable("refused".to_owned()).into(),
            ContextStoreError::Unavailable("timeout".to_owned()).into(),
            TokenIntrospectionError::Unavailable("dns".to_owned()).into(),
            EntitlementError::Unavailable("reset".to_owned()).into(),
        ];

        for err in errors {
            assert_eq!(
                err.classify(),
                (StatusCode::INTERNAL_SERVER_ERROR, Cow::Borrowed(STORE_UNAVAILABLE))
            );
        }
    }

    #[test]
    fn entitlement_tenant_not_found_is_server_error() {
        let err: GatewayError = EntitlementError::TenantNotFound {
            tenant: TenantId::new("clinicA"),
        }
        .into();

        assert_eq!(err.classify().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_token_is_invalid_access_token() {
        let err: GatewayError = TokenIntrospectionError::Unauthorized("expired".to_owned()).into();

        assert_eq!(
            err.classify(),
            (StatusCode::UNAUTHORIZED, Cow::Borrowed(INVALID_TOKEN))
        );
    }

    #[test]
    fn unclassified_failures_are_generic() {
        let err = GatewayError::from(anyhow::anyhow!("boom"));
        assert_eq!(
            err.classify(),
            (StatusCode::INTERNAL_SERVER_ERROR, Cow::Borrowed(UNEXPECTED))
        );

        let err = GatewayError::from(NoActiveContext);
        assert_eq!(err.classify().0, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn into_response_writes_json_body() {
        let res = GatewayError::forbidden(SERVICE_NOT_ENABLED).into_response();

        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert!(is_json(res.headers()));
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.message, SERVICE_NOT_ENABLED);
    }

    #[test]
    fn panic_response_hides_payload() {
        let res = panic_response(Box::new("secret detail".to_owned()));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(is_json(res.headers()));
    }
}

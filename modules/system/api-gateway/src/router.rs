use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::field::Empty;

use crate::auth::build_route_policy;
use crate::config::ApiGatewayConfig;
use crate::error::{error_normalization_middleware, panic_response};
use crate::middleware::request_id::{MakeReqId, header};
use crate::pipeline::{ClinicClients, ContextPipeline, context_pipeline_middleware};
use crate::web::{self, CONTEXT_PATH, HEALTH_PATH};

/// Assemble the gateway router: built-in routes, `routes`, and the middleware stack.
///
/// `routes` must not redefine `/health` or `/api/v1/context`.
///
/// # Errors
/// Returns an error if the configured route policy is invalid.
pub fn build_router(
    config: &ApiGatewayConfig,
    clients: ClinicClients,
    routes: Router,
) -> Result<Router> {
    let route_policy = build_route_policy(config)?;
    let pipeline = Arc::new(ContextPipeline::new(config.clone(), route_policy, clients));

    let router = Router::new()
        .route(HEALTH_PATH, get(web::health_check))
        .route(CONTEXT_PATH, get(web::context_view))
        .merge(routes);

    Ok(apply_middleware_stack(router, config, pipeline))
}

/// Apply the middleware stack.
///
/// `Router::layer` makes the last added layer the outermost one, so layers are added
/// innermost first. Request execution order (outermost -> innermost):
/// `SetRequestId` -> `PropagateRequestId` -> Trace -> `CatchPanic` -> error normalization
/// -> body limit -> context pipeline -> router
fn apply_middleware_stack(
    mut router: Router,
    config: &ApiGatewayConfig,
    pipeline: Arc<ContextPipeline>,
) -> Router {
    // 6) Context pipeline
    router = router.layer(from_fn_with_state(pipeline, context_pipeline_middleware));

    // 5) Body limit
    router = router.layer(RequestBodyLimitLayer::new(config.body_limit_bytes));
    router = router.layer(DefaultBodyLimit::max(config.body_limit_bytes));

    // 4) Error normalization (outer to body limit so its 413 gets a JSON body too)
    router = router.layer(from_fn(error_normalization_middleware));

    // 3) Panics become the generic 500 body; the holder scope unwinds with the future
    router = router.layer(CatchPanicLayer::custom(panic_response));

    // 2) Trace
    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                let rid = req
                    .headers()
                    .get(header())
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("n/a");

                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    version = ?req.version(),
                    module = "api_gateway",
                    request_id = %rid,
                    tenant_id = Empty,
                    status = Empty,
                    latency_ms = Empty,
                )
            })
            .on_response(
                |res: &axum::http::Response<axum::body::Body>,
                 latency: std::time::Duration,
                 span: &tracing::Span| {
                    span.record("status", res.status().as_u16());
                    span.record("latency_ms", latency.as_millis());
                },
            ),
    );

    // 1) Request ID handling: generate when missing, then echo it on the response
    router = router.layer(PropagateRequestIdLayer::new(header()));
    router = router.layer(SetRequestIdLayer::new(header(), MakeReqId));

    router
}

fn parse_bind_address(bind_addr: &str) -> Result<SocketAddr> {
    bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
}

/// Bind and serve until `shutdown` resolves, then drain in-flight requests.
///
/// # Errors
/// Returns an error if the address is invalid, binding fails, or the server fails.
pub async fn serve<F>(router: Router, bind_addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = parse_bind_address(bind_addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn bind_address_must_be_socket_addr() {
        assert!(parse_bind_address("127.0.0.1:8080").is_ok());
        assert!(parse_bind_address("localhost").is_err());
    }
}

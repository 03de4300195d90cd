//! Route classification and bearer credential extraction.

use std::{collections::HashMap, sync::Arc};

use axum::http::{HeaderMap, Method, header};

use crate::config::{ApiGatewayConfig, RouteConfig};

/// Path patterns registered for one HTTP method.
#[derive(Clone)]
pub struct RouteMatcher {
    matcher: matchit::Router<()>,
}

impl RouteMatcher {
    fn new() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }

    fn insert(&mut self, path: &str) -> Result<(), matchit::InsertError> {
        self.matcher.insert(path, ())
    }

    fn find(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

/// Convert `:param` segments to matchit's `{param}` syntax.
fn convert_axum_path_to_matchit(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ':' {
            result.push('{');
            while matches!(chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            result.push('}');
        } else {
            result.push(ch);
        }
    }

    result
}

/// Whether a route requires a bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRequirement {
    /// Public route: requests without a credential pass through anonymously.
    None,
    /// A credential is mandatory.
    Required,
}

/// Classifies `(method, path)` pairs as public or authenticated.
#[derive(Clone)]
pub struct GatewayRoutePolicy {
    authenticated: Arc<HashMap<Method, RouteMatcher>>,
    public: Arc<HashMap<Method, RouteMatcher>>,
    require_auth_by_default: bool,
}

impl GatewayRoutePolicy {
    /// Build a policy from explicit route lists.
    ///
    /// # Errors
    /// Returns an error for an unknown HTTP method or a conflicting path pattern.
    pub fn new(
        authenticated_routes: &[RouteConfig],
        public_routes: &[RouteConfig],
        require_auth_by_default: bool,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            authenticated: Arc::new(build_matchers(authenticated_routes)?),
            public: Arc::new(build_matchers(public_routes)?),
            require_auth_by_default,
        })
    }

    /// Resolve the authentication requirement for a given (method, path).
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> AuthRequirement {
        let is_authenticated = self
            .authenticated
            .get(method)
            .is_some_and(|matcher| matcher.find(path));

        let is_public = self
            .public
            .get(method)
            .is_some_and(|matcher| matcher.find(path));

        if is_authenticated || (self.require_auth_by_default && !is_public) {
            AuthRequirement::Required
        } else {
            AuthRequirement::None
        }
    }
}

fn build_matchers(routes: &[RouteConfig]) -> anyhow::Result<HashMap<Method, RouteMatcher>> {
    let mut matchers: HashMap<Method, RouteMatcher> = HashMap::new();

    for route in routes {
        let method = Method::from_bytes(route.method.to_ascii_uppercase().as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid HTTP method '{}': {e}", route.method))?;
        let matchit_path = convert_axum_path_to_matchit(&route.path);
        matchers
            .entry(method)
            .or_insert_with(RouteMatcher::new)
            .insert(&matchit_path)
            .map_err(|e| anyhow::anyhow!("Failed to insert route pattern '{}': {e}", route.path))?;
    }

    Ok(matchers)
}

/// Build the gateway's route policy: configured public routes plus the built-in ones.
///
/// # Errors
/// Returns an error if a configured route is invalid.
pub fn build_route_policy(cfg: &ApiGatewayConfig) -> anyhow::Result<GatewayRoutePolicy> {
    let mut public = vec![RouteConfig {
        method: "GET".to_owned(),
        path: "/health".to_owned(),
    }];
    public.extend(
        cfg.public_routes
            .iter()
            .filter(|r| !(r.method.eq_ignore_ascii_case("GET") && r.path == "/health"))
            .cloned(),
    );
    let authenticated = [RouteConfig {
        method: "GET".to_owned(),
        path: crate::web::CONTEXT_PATH.to_owned(),
    }];

    GatewayRoutePolicy::new(&authenticated, &public, cfg.require_auth_by_default)
}

/// Extract the bearer token from the `Authorization` header.
#[must_use]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
        .filter(|t| !t.is_empty())
}

/// CORS preflight: `OPTIONS` with both `Origin` and `Access-Control-Request-Method`.
#[must_use]
pub fn is_preflight_request(method: &Method, headers: &HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(header::ORIGIN)
        && headers.contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

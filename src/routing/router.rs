//! Route lookup and request rewriting.
//!
//! # Responsibilities
//! - Store compiled prefix mappings in table order
//! - Decide, per request, between forwarding and the fallback page
//! - Build the outbound request (target URL, method, headers, body)
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan, first match wins (not longest prefix)
//! - `/` and `/index.html` are reserved for the fallback page
//! - Explicit ServeFallback rather than an error

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri};

use crate::config::{MappingTable, PrefixMapping};
use crate::routing::matcher::{PathPrefixMatcher, SubpathRewrite};

/// Paths that always get the fallback page, whatever the table says.
pub const RESERVED_PATHS: [&str; 2] = ["/", "/index.html"];

/// A request ready to be sent upstream.
#[derive(Debug)]
pub struct OutboundRequest {
    /// Absolute `https://` URL.
    pub url: String,
    pub method: Method,
    /// Inbound headers, copied verbatim (including `Host`).
    pub headers: HeaderMap,
    /// Inbound body, not buffered.
    pub body: Body,
}

/// Result of routing one request.
#[derive(Debug)]
pub enum RouteDecision {
    Forward(OutboundRequest),
    ServeFallback,
}

#[derive(Debug)]
struct CompiledRoute {
    matcher: PathPrefixMatcher,
    target_domain: String,
    rewrites: Vec<SubpathRewrite>,
}

impl From<&PrefixMapping> for CompiledRoute {
    fn from(mapping: &PrefixMapping) -> Self {
        Self {
            matcher: PathPrefixMatcher::new(mapping.prefix.clone()),
            target_domain: mapping.target_domain.clone(),
            rewrites: mapping.path_mapping.iter().map(SubpathRewrite::from).collect(),
        }
    }
}

/// Rewrites request paths according to a mapping table.
#[derive(Debug)]
pub struct PathRouter {
    routes: Vec<CompiledRoute>,
}

impl PathRouter {
    /// Compile a router from a mapping table, keeping its order.
    pub fn new(table: &MappingTable) -> Self {
        Self {
            routes: table.iter().map(CompiledRoute::from).collect(),
        }
    }

    /// Number of compiled prefix mappings.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Route a request. Never fails: anything unroutable becomes `ServeFallback`.
    pub fn route(&self, request: Request<Body>) -> RouteDecision {
        let Some(url) = self.resolve(request.uri()) else {
            return RouteDecision::ServeFallback;
        };

        let (parts, body) = request.into_parts();
        RouteDecision::Forward(OutboundRequest {
            url,
            method: parts.method,
            headers: parts.headers,
            body,
        })
    }

    /// Compute the upstream URL for a request URI, or `None` for the fallback page.
    pub fn resolve(&self, uri: &Uri) -> Option<String> {
        let query = match uri.query() {
            Some(q) if !q.is_empty() => format!("?{}", q),
            _ => String::new(),
        };
        self.resolve_path(uri.path(), &query)
    }

    /// Compute the upstream URL from a path and a query string (with its leading `?`, or empty).
    pub fn resolve_path(&self, path: &str, query: &str) -> Option<String> {
        if RESERVED_PATHS.contains(&path) {
            return None;
        }

        let (route, remaining) = self
            .routes
            .iter()
            .find_map(|route| route.matcher.strip(path).map(|rest| (route, rest)))?;

        let target_path = route
            .rewrites
            .iter()
            .find_map(|rewrite| rewrite.apply(remaining))
            .unwrap_or_else(|| remaining.to_string());

        tracing::trace!(
            prefix = route.matcher.prefix(),
            target_domain = %route.target_domain,
            target_path = %target_path,
            "Route matched"
        );

        Some(format!("https://{}{}{}", route.target_domain, target_path, query))
    }
}

//! Prefix-based request router.
//!
//! Rewrites incoming requests by path prefix and forwards them to an HTTPS
//! upstream, or serves a static fallback page when no prefix applies.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{PathRouter, RouteDecision};

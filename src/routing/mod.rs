//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query, method, headers, body)
//!     → router.rs (reserved paths, prefix scan)
//!     → matcher.rs (strip prefix, rewrite subpath)
//!     → Return: Forward(OutboundRequest) or ServeFallback
//!
//! Route Compilation (at startup and on reload):
//!     MappingTable
//!     → Keep table order
//!     → Compile matchers
//!     → Freeze as immutable PathRouter
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - No regex, no I/O in the routing path
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod matcher;
pub mod router;

pub use router::{OutboundRequest, PathRouter, RouteDecision};

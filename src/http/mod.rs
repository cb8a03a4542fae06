//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (assign request ID)
//!     → routing::PathRouter (Forward or ServeFallback)
//!     → forward.rs (upstream call, response streamed back verbatim)
//!       or fallback.rs (static page, 200)
//!     → Send to client
//! ```

pub mod fallback;
pub mod forward;
pub mod request;
pub mod server;

pub use fallback::FallbackPage;
pub use forward::{ForwardError, Forwarder};
pub use request::{RequestId, RequestIdExt, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};

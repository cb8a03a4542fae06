//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → MAPPING_TABLE env (JSON, replaces file mappings; bad JSON → built-in table)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the PathRouter and swaps it in atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError, MAPPING_TABLE_ENV};
pub use schema::ProxyConfig;
pub use schema::ListenerConfig;
pub use schema::{MappingTable, PathRewrite, PrefixMapping};
pub use schema::{FallbackConfig, ObservabilityConfig, TimeoutConfig, UpstreamConfig};

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::Deserialize;

/// Root configuration for the router.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream client settings.
    pub upstream: UpstreamConfig,

    /// Fallback page settings.
    pub fallback: FallbackConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Hot reload settings.
    pub reload: ReloadConfig,

    /// Ordered prefix mappings. Defaults to the built-in table when absent.
    pub mappings: MappingTable,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Upstream client configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Maximum number of redirects followed per forwarded request. Zero disables following.
    pub max_redirects: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { max_redirects: 10 }
    }
}

/// Fallback page configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Optional HTML file replacing the built-in page. Read once at startup.
    pub page_path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Hot reload configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Watch the config file and apply changes without restart.
    pub watch: bool,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self { watch: true }
    }
}

/// One subpath rewrite inside a prefix mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathRewrite {
    /// Subpath looked up at the start of the remaining path.
    pub source: String,

    /// Replacement for the first occurrence of `source`.
    pub dest: String,
}

impl PathRewrite {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            dest: dest.into(),
        }
    }
}

/// A path prefix forwarded to an upstream domain.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrefixMapping {
    /// Path prefix to match, starting with `/`.
    pub prefix: String,

    /// Upstream host (optionally with port) the request is sent to over HTTPS.
    pub target_domain: String,

    /// Ordered subpath rewrites applied after the prefix is stripped.
    #[serde(default)]
    pub path_mapping: Vec<PathRewrite>,
}

impl PrefixMapping {
    pub fn new(prefix: impl Into<String>, target_domain: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target_domain: target_domain.into(),
            path_mapping: Vec::new(),
        }
    }

    /// Append a subpath rewrite.
    pub fn rewrite(mut self, source: impl Into<String>, dest: impl Into<String>) -> Self {
        self.path_mapping.push(PathRewrite::new(source, dest));
        self
    }
}

/// Ordered prefix mappings. Order decides which prefix wins when several match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MappingTable(Vec<PrefixMapping>);

impl MappingTable {
    pub fn new(mappings: Vec<PrefixMapping>) -> Self {
        Self(mappings)
    }

    /// The table used when no configuration is supplied or it cannot be parsed.
    pub fn builtin() -> Self {
        Self(vec![
            PrefixMapping::new("/google", "dns.google").rewrite("/query-dns", "/dns-query"),
            PrefixMapping::new("/", "one.one.one.one").rewrite("/query-dns", "/dns-query"),
            PrefixMapping::new("/cloudflare", "one.one.one.one").rewrite("/query-dns", "/dns-query"),
            PrefixMapping::new("/quad9", "dns.quad9.net").rewrite("/query-dns", "/dns-query"),
        ])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PrefixMapping> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl From<Vec<PrefixMapping>> for MappingTable {
    fn from(mappings: Vec<PrefixMapping>) -> Self {
        Self(mappings)
    }
}

impl<'a> IntoIterator for &'a MappingTable {
    type Item = &'a PrefixMapping;
    type IntoIter = std::slice::Iter<'a, PrefixMapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

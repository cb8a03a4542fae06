//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check every mapping has a usable prefix and upstream domain
//! - Detect duplicate prefixes (the later one could never match)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::{PrefixMapping, ProxyConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address `{0}`")]
    BindAddress(String),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("prefix `{0}` must start with `/`")]
    PrefixWithoutSlash(String),

    #[error("prefix `{prefix}` has an empty target domain")]
    EmptyDomain { prefix: String },

    #[error("prefix `{prefix}` has an invalid target domain `{domain}`")]
    InvalidDomain { prefix: String, domain: String },

    #[error("prefix `{0}` is defined more than once")]
    DuplicatePrefix(String),
}

/// Validate a whole configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let mut seen = HashSet::new();
    for mapping in &config.mappings {
        if let Err(e) = validate_mapping(mapping) {
            errors.push(e);
        }
        if !seen.insert(mapping.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(mapping.prefix.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check a single mapping entry.
///
/// Also used to filter entries coming from the `MAPPING_TABLE` environment value,
/// where bad entries are skipped instead of failing the load.
pub fn validate_mapping(mapping: &PrefixMapping) -> Result<(), ValidationError> {
    if !mapping.prefix.starts_with('/') {
        return Err(ValidationError::PrefixWithoutSlash(mapping.prefix.clone()));
    }

    let domain = mapping.target_domain.as_str();
    if domain.is_empty() {
        return Err(ValidationError::EmptyDomain {
            prefix: mapping.prefix.clone(),
        });
    }

    // The domain is spliced between the scheme and the path, so it must be a bare authority.
    let invalid = || ValidationError::InvalidDomain {
        prefix: mapping.prefix.clone(),
        domain: domain.to_string(),
    };
    if domain.contains(['/', '?', '#', '@']) || domain.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    match Url::parse(&format!("https://{}", domain)) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::MappingTable;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.timeouts.request_secs = 0;
        config.mappings = MappingTable::new(vec![
            PrefixMapping::new("api", "api.example"),
            PrefixMapping::new("/a", ""),
            PrefixMapping::new("/b", "b.example"),
            PrefixMapping::new("/b", "other.example"),
        ]);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("not-an-address".into()),
                ValidationError::ZeroRequestTimeout,
                ValidationError::PrefixWithoutSlash("api".into()),
                ValidationError::EmptyDomain { prefix: "/a".into() },
                ValidationError::DuplicatePrefix("/b".into()),
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn domain_shapes() {
        assert!(validate_mapping(&PrefixMapping::new("/x", "dns.google")).is_ok());
        assert!(validate_mapping(&PrefixMapping::new("/x", "127.0.0.1:8443")).is_ok());
        assert!(validate_mapping(&PrefixMapping::new("/x", "[::1]:8443")).is_ok());

        for bad in ["dns.google/path", "user@host", "has space", "host?q", "host:notaport"] {
            assert!(
                matches!(
                    validate_mapping(&PrefixMapping::new("/x", bad)),
                    Err(ValidationError::InvalidDomain { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }
}

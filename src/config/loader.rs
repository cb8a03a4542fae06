//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::schema::{MappingTable, PathRewrite, PrefixMapping, ProxyConfig};
use crate::config::validation::{validate_config, validate_mapping, ValidationError};

/// Environment variable holding a JSON mapping table.
pub const MAPPING_TABLE_ENV: &str = "MAPPING_TABLE";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mapping table must be a JSON object keyed by prefix")]
    NotAnObject,

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration, honouring `MAPPING_TABLE` from the process environment.
///
/// Without a path the defaults are used.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let env_table = std::env::var(MAPPING_TABLE_ENV).ok();
    load_config_with_overrides(path, env_table.as_deref())
}

/// Same as [`load_config`] with the `MAPPING_TABLE` value passed in explicitly.
pub fn load_config_with_overrides(
    path: Option<&Path>,
    mapping_json: Option<&str>,
) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str::<ProxyConfig>(&content)?
        }
        None => ProxyConfig::default(),
    };

    if let Some(raw) = mapping_json {
        config.mappings = mapping_table_or_default(raw);
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a JSON mapping table, falling back to the built-in table on failure.
///
/// The failure is logged and never surfaced to callers.
pub fn mapping_table_or_default(raw: &str) -> MappingTable {
    match parse_mapping_table(raw) {
        Ok(table) => {
            tracing::info!(entries = table.len(), "Loaded mapping table from {}", MAPPING_TABLE_ENV);
            table
        }
        Err(e) => {
            tracing::error!(error = %e, "Invalid {}, using built-in mapping table", MAPPING_TABLE_ENV);
            MappingTable::builtin()
        }
    }
}

#[derive(Deserialize)]
struct JsonMapping {
    #[serde(rename = "targetDomain")]
    target_domain: String,
    #[serde(rename = "pathMapping", default)]
    path_mapping: Map<String, Value>,
}

/// Parse a JSON mapping table of the form
/// `{"/prefix": {"targetDomain": "host", "pathMapping": {"/from": "/to"}}}`.
///
/// Key order is kept. Malformed entries are skipped with a warning.
pub fn parse_mapping_table(raw: &str) -> Result<MappingTable, ConfigError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(entries) = value else {
        return Err(ConfigError::NotAnObject);
    };

    let mut mappings = Vec::with_capacity(entries.len());
    for (prefix, entry) in entries {
        let parsed: JsonMapping = match serde_json::from_value(entry) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(prefix = %prefix, error = %e, "Skipping malformed mapping entry");
                continue;
            }
        };

        let mut mapping = PrefixMapping::new(prefix, parsed.target_domain);
        for (source, dest) in parsed.path_mapping {
            match dest {
                Value::String(dest) => mapping.path_mapping.push(PathRewrite::new(source, dest)),
                other => tracing::warn!(
                    prefix = %mapping.prefix,
                    source = %source,
                    value = %other,
                    "Skipping non-string path rewrite"
                ),
            }
        }

        if let Err(e) = validate_mapping(&mapping) {
            tracing::warn!(error = %e, "Skipping invalid mapping entry");
            continue;
        }
        mappings.push(mapping);
    }

    Ok(MappingTable::new(mappings))
}

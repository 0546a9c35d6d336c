//! Configuration types and loading
//!
//! Library defaults for search tokenizing and property-path writes,
//! overridable from `HIQUAL_*` environment variables.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{CollectionPolicy, NullPolicy};

/// Main library configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HqConfig {
    /// Full-text search defaults
    pub search: SearchDefaults,

    /// Property path defaults
    pub paths: PathDefaults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchDefaults {
    /// Prefix every token with `%`
    pub leading_wildcard: bool,
    /// Suffix every token with `%`
    pub trailing_wildcard: bool,
    pub case_sensitive: bool,
    /// Maximum number of tokens kept from a search string
    pub token_limit: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            leading_wildcard: true,
            trailing_wildcard: true,
            case_sensitive: false,
            token_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathDefaults {
    /// Regex splitting a property path into segments
    pub separator: String,
    pub null_policy: NullPolicy,
    pub collection_policy: CollectionPolicy,
}

impl Default for PathDefaults {
    fn default() -> Self {
        Self {
            separator: r"\.".to_string(),
            null_policy: NullPolicy::None,
            collection_policy: CollectionPolicy::Copy,
        }
    }
}

impl PathDefaults {
    /// Compile the separator pattern
    pub fn separator_regex(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.separator).map_err(|e| ConfigError::InvalidValue {
            key: "HIQUAL_PATH_SEPARATOR".to_string(),
            message: e.to_string(),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(invalid(key, format!("'{}' is not a boolean", other))),
    }
}

impl HqConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Search
        if let Some(v) = lookup("HIQUAL_SEARCH_TOKEN_LIMIT") {
            config.search.token_limit = v
                .trim()
                .parse()
                .map_err(|_| invalid("HIQUAL_SEARCH_TOKEN_LIMIT", format!("'{}' is not a count", v)))?;
        }
        if let Some(v) = lookup("HIQUAL_SEARCH_LEADING_WILDCARD") {
            config.search.leading_wildcard = parse_bool("HIQUAL_SEARCH_LEADING_WILDCARD", &v)?;
        }
        if let Some(v) = lookup("HIQUAL_SEARCH_TRAILING_WILDCARD") {
            config.search.trailing_wildcard = parse_bool("HIQUAL_SEARCH_TRAILING_WILDCARD", &v)?;
        }
        if let Some(v) = lookup("HIQUAL_SEARCH_CASE_SENSITIVE") {
            config.search.case_sensitive = parse_bool("HIQUAL_SEARCH_CASE_SENSITIVE", &v)?;
        }

        // Paths
        if let Some(v) = lookup("HIQUAL_PATH_SEPARATOR") {
            config.paths.separator = v;
            config.paths.separator_regex()?;
        }
        if let Some(v) = lookup("HIQUAL_PATH_NULL_POLICY") {
            config.paths.null_policy = NullPolicy::from_str(&v)
                .ok_or_else(|| invalid("HIQUAL_PATH_NULL_POLICY", format!("unknown policy '{}'", v)))?;
        }
        if let Some(v) = lookup("HIQUAL_PATH_COLLECTION_POLICY") {
            config.paths.collection_policy = CollectionPolicy::from_str(&v).ok_or_else(|| {
                invalid("HIQUAL_PATH_COLLECTION_POLICY", format!("unknown policy '{}'", v))
            })?;
        }

        tracing::debug!(
            token_limit = config.search.token_limit,
            separator = %config.paths.separator,
            "loaded hiqual configuration"
        );

        Ok(config)
    }
}

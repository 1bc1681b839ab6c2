//! Configuration types and loading
//!
//! Pagination defaults used to be process-wide settings; here they are a
//! plain value handed to the resolver and compiler.

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SieveConfig {
    /// Pagination defaults and bounds
    #[serde(default)]
    pub pagination: PaginationConfig,
}

/// Pagination defaults and bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Page size used when the request does not supply `per`
    pub default_per_page: u32,
    /// Largest accepted `per`; larger values drop pagination entirely
    pub max_per_page: u32,
    /// Pages shown on each side of the current page
    pub window: u32,
    /// Pages shown at each end of the page list
    pub outer_window: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_per_page: 10,
            max_per_page: 50,
            window: 1,
            outer_window: 1,
        }
    }
}

impl PaginationConfig {
    /// Return a copy with the maximum page size replaced
    pub fn with_max_per_page(mut self, max_per_page: u32) -> Self {
        self.max_per_page = max_per_page;
        self
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl SieveConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let pagination = &mut config.pagination;

        if let Some(v) = lookup("SIEVE_DEFAULT_PER_PAGE") {
            pagination.default_per_page = parse_positive("SIEVE_DEFAULT_PER_PAGE", &v)?;
        }
        if let Some(v) = lookup("SIEVE_MAX_PER_PAGE") {
            pagination.max_per_page = parse_positive("SIEVE_MAX_PER_PAGE", &v)?;
        }
        if let Some(v) = lookup("SIEVE_PAGE_WINDOW") {
            pagination.window = parse_number("SIEVE_PAGE_WINDOW", &v)?;
        }
        if let Some(v) = lookup("SIEVE_PAGE_OUTER_WINDOW") {
            pagination.outer_window = parse_number("SIEVE_PAGE_OUTER_WINDOW", &v)?;
        }

        if pagination.default_per_page > pagination.max_per_page {
            return Err(ConfigError::InvalidValue {
                key: "SIEVE_DEFAULT_PER_PAGE".to_string(),
                message: format!(
                    "{} exceeds max per page {}",
                    pagination.default_per_page, pagination.max_per_page
                ),
            });
        }

        tracing::debug!(
            default_per_page = pagination.default_per_page,
            max_per_page = pagination.max_per_page,
            "Loaded pagination configuration"
        );

        Ok(config)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{}", e),
    })
}

fn parse_positive(key: &str, value: &str) -> Result<u32, ConfigError> {
    match parse_number(key, value)? {
        0 => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be at least 1".to_string(),
        }),
        n => Ok(n),
    }
}

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate registry endpoints are absolute http(s) URLs
//! - Validate value ranges (backoff delays)
//! - Detect incomplete auth/TLS sections
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProviderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use url::Url;

use crate::config::schema::ProviderConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProviderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoints = config.registry.endpoints();
    if endpoints.is_empty() {
        errors.push(ValidationError::new("registry.endpoint", "at least one endpoint is required"));
    }
    for endpoint in &endpoints {
        match Url::parse(endpoint) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::new(
                "registry.endpoint",
                format!("unsupported scheme '{}' in {}", url.scheme(), endpoint),
            )),
            Err(e) => errors.push(ValidationError::new(
                "registry.endpoint",
                format!("invalid URL '{}': {}", endpoint, e),
            )),
        }
    }

    if let Some(basic) = &config.registry.basic {
        if basic.http_basic_auth_user.is_empty() {
            errors.push(ValidationError::new("registry.basic.http_basic_auth_user", "must not be empty"));
        }
    }

    if let Some(tls) = &config.registry.tls {
        if tls.cert.is_some() != tls.key.is_some() {
            errors.push(ValidationError::new("registry.tls", "cert and key must be set together"));
        }
    }

    if config.backoff.base_delay_ms == 0 {
        errors.push(ValidationError::new("backoff.base_delay_ms", "must be greater than zero"));
    }
    if config.backoff.base_delay_ms > config.backoff.max_delay_ms {
        errors.push(ValidationError::new(
            "backoff.max_delay_ms",
            "must not be smaller than base_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the provider.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::provider::constraints::Constraint;

/// Root configuration for the Marathon provider.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProviderConfig {
    /// Registry connection settings (endpoint, auth, TLS, timeouts).
    pub registry: RegistryConfig,

    /// Filtering and synthesis settings.
    pub discovery: DiscoveryConfig,

    /// Reconnect backoff.
    pub backoff: BackoffConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Registry client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Marathon endpoint. Several endpoints may be given comma-separated;
    /// they are tried in order.
    pub endpoint: String,

    /// DC/OS ACS token. Overrides basic authentication when set.
    pub dcos_token: Option<String>,

    /// HTTP basic authentication.
    pub basic: Option<BasicAuthConfig>,

    /// Client TLS settings.
    pub tls: Option<ClientTlsConfig>,

    /// TCP connect timeout in seconds.
    pub dialer_timeout_secs: u64,

    /// TCP keep-alive interval in seconds.
    pub keep_alive_secs: u64,

    /// Timeout for non-streaming requests in seconds.
    pub response_timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            dcos_token: None,
            basic: None,
            tls: None,
            dialer_timeout_secs: 60,
            keep_alive_secs: 10,
            response_timeout_secs: 30,
        }
    }
}

impl RegistryConfig {
    /// Individual endpoints in failover order.
    pub fn endpoints(&self) -> Vec<String> {
        self.endpoint
            .split(',')
            .map(|e| e.trim().trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty())
            .collect()
    }
}

/// HTTP basic authentication credentials.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    pub http_basic_auth_user: String,
    pub http_basic_password: String,
}

/// Client TLS material for talking to the registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientTlsConfig {
    /// CA bundle (PEM) used to verify the registry.
    pub ca: Option<String>,

    /// Client certificate (PEM).
    pub cert: Option<String>,

    /// Client private key (PEM).
    pub key: Option<String>,

    /// Skip server certificate verification.
    pub insecure_skip_verify: bool,
}

/// Discovery, filtering and synthesis settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Default domain for generated host rules.
    pub domain: String,

    /// Expose applications that carry no enable label.
    pub exposed_by_default: bool,

    /// Turn application groups into subdomains (`/a/b` -> `b.a`).
    pub groups_as_subdomains: bool,

    /// Honour marathon-lb labels (`HAPROXY_GROUP`, `HAPROXY_0_VHOST`).
    pub marathon_lb_compatibility: bool,

    /// Always route to the task host, even with IP-per-task.
    pub force_task_hostname: bool,

    /// Subscribe to the registry event stream.
    pub watch: bool,

    /// Tag constraints, e.g. `tag==api*` or `tag!=internal`.
    pub constraints: Vec<Constraint>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            exposed_by_default: true,
            groups_as_subdomains: false,
            marathon_lb_compatibility: false,
            force_task_hostname: false,
            watch: true,
            constraints: Vec::new(),
        }
    }
}

/// Exponential backoff between connection attempts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 60_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
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
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

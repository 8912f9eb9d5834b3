//! Synthesized routing configuration types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Complete routing configuration produced by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfiguration {
    pub backends: BTreeMap<String, Backend>,
    pub frontends: BTreeMap<String, Frontend>,
}

impl RoutingConfiguration {
    /// Total number of servers across all backends.
    pub fn server_count(&self) -> usize {
        self.backends.values().map(|b| b.servers.len()).sum()
    }
}

/// A pool of servers for one logical service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backend {
    pub servers: BTreeMap<String, Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreaker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_conn: Option<MaxConn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    /// `<protocol>://<address>:<port>`
    pub url: String,
    pub weight: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub method: String,
    pub sticky: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreaker {
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaxConn {
    pub amount: i64,
    pub extractor_func: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub path: String,
    pub interval: String,
}

/// Request matching rules pointing at a backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frontend {
    pub backend: String,
    pub entry_points: Vec<String>,
    pub pass_host_header: bool,
    pub priority: i32,
    pub basic_auth: Vec<String>,
    pub routes: BTreeMap<String, Route>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub rule: String,
}

/// Message published to the routing core after each successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMessage {
    pub provider_name: String,
    pub configuration: RoutingConfiguration,
}

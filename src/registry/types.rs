//! Marathon wire model.
//!
//! Snapshots are deserialized straight from `/v2/apps?embed=apps.tasks` and
//! never mutated afterwards; filtering builds new collections.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::provider::labels::Labels;

/// Lifecycle state of a task eligible for routing.
pub const TASK_RUNNING: &str = "TASK_RUNNING";

/// Lifecycle state of a task that is still being launched.
pub const TASK_STAGING: &str = "TASK_STAGING";

/// Response body of the application listing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationList {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub apps: Vec<Application>,
}

/// A deployable service definition.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Hierarchical identifier, e.g. `/group/app`.
    pub id: String,

    /// Free-form labels. Absent labels behave like an empty map.
    #[serde(default)]
    pub labels: Option<HashMap<String, String>>,

    #[serde(default)]
    pub port_definitions: Option<Vec<PortDefinition>>,

    /// IP-per-task settings; `None` means tasks are reached via their host.
    #[serde(default, rename = "ipAddress")]
    pub ip_address_per_task: Option<IpAddressPerTask>,

    #[serde(default)]
    pub health_checks: Option<Vec<HealthCheck>>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<Task>,
}

impl Application {
    pub fn labels(&self) -> Labels<'_> {
        Labels::new(self.labels.as_ref())
    }

    /// True when at least one health check is declared.
    pub fn has_health_checks(&self) -> bool {
        self.health_checks.as_ref().is_some_and(|checks| !checks.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PortDefinition {
    #[serde(default)]
    pub port: Option<u32>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct IpAddressPerTask {
    #[serde(default)]
    pub discovery: Option<Discovery>,
}

impl IpAddressPerTask {
    /// Port numbers advertised through service discovery.
    pub fn discovery_ports(&self) -> Vec<u32> {
        self.discovery
            .as_ref()
            .and_then(|d| d.ports.as_ref())
            .map(|ports| ports.iter().map(|p| p.number).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Discovery {
    #[serde(default)]
    pub ports: Option<Vec<DiscoveryPort>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DiscoveryPort {
    pub number: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
}

/// Health check declaration on an application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub interval_seconds: Option<u32>,
}

/// A running (or launching) instance of an application.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,

    #[serde(default)]
    pub app_id: String,

    #[serde(default)]
    pub host: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub ports: Vec<u32>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub ip_addresses: Vec<IpAddress>,

    #[serde(default)]
    pub state: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub health_check_results: Vec<HealthCheckResult>,
}

impl Task {
    pub fn is_running(&self) -> bool {
        self.state == TASK_RUNNING
    }

    pub fn has_health_check_results(&self) -> bool {
        !self.health_check_results.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAddress {
    pub ip_address: String,
    #[serde(default)]
    pub protocol: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResult {
    pub alive: bool,
}

/// Query options for the application listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub embed: Vec<String>,
}

impl ApplicationQuery {
    /// Listing with task data embedded in every application.
    pub fn with_tasks() -> Self {
        Self {
            embed: vec!["apps.tasks".to_string()],
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        self.embed.iter().map(|e| ("embed", e.clone())).collect()
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

//! Endpoint resolution: which port and address of a task receives traffic.
//!
//! Resolution is a pure function of (application, task). Unlike label
//! defaults, a bad port or index is a hard failure that excludes the task.

use thiserror::Error;

use crate::provider::labels::{LABEL_IP_ADDRESS_INDEX, LABEL_PORT, LABEL_PORT_INDEX};
use crate::registry::{Application, Task};

/// Why a task has no usable endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("failed to parse port label '{0}'")]
    InvalidPortLabel(String),

    #[error("explicitly specified port {0} must be larger than zero")]
    NonPositivePort(i64),

    #[error("port {0} is out of range")]
    PortOutOfRange(i64),

    #[error("no port found")]
    NoPort,

    #[error("failed to parse index '{0}'")]
    InvalidIndex(String),

    #[error("index {index} must be within range (0, {max})")]
    IndexOutOfRange { index: i64, max: i64 },

    #[error("cannot use port index to select from {count} ports: {source}")]
    PortIndex {
        count: usize,
        #[source]
        source: Box<EndpointError>,
    },

    #[error("missing IP address")]
    NoIpAddress,

    #[error("found {0} task IP addresses but missing IP address index")]
    MissingIpAddressIndex(usize),

    #[error("cannot use IP address index to select from {count} task IP addresses: {source}")]
    IpAddressIndex {
        count: usize,
        #[source]
        source: Box<EndpointError>,
    },
}

/// Parse `index` and check it selects an element of a list of `length`.
pub fn parse_index(index: &str, length: usize) -> Result<usize, EndpointError> {
    let parsed: i64 = index
        .parse()
        .map_err(|_| EndpointError::InvalidIndex(index.to_string()))?;
    let max = length as i64 - 1;
    if parsed < 0 || parsed > max {
        return Err(EndpointError::IndexOutOfRange { index: parsed, max });
    }
    Ok(parsed as usize)
}

/// Resolve the port traffic should be sent to.
pub fn resolve_port(app: &Application, task: &Task) -> Result<u16, EndpointError> {
    let labels = app.labels();

    if let Some(raw) = labels.get(LABEL_PORT) {
        let port: i64 = raw
            .parse()
            .map_err(|_| EndpointError::InvalidPortLabel(raw.to_string()))?;
        if port <= 0 {
            return Err(EndpointError::NonPositivePort(port));
        }
        return u16::try_from(port).map_err(|_| EndpointError::PortOutOfRange(port));
    }

    let ports = available_ports(app, task);
    if ports.is_empty() {
        return Err(EndpointError::NoPort);
    }

    let index = match labels.get(LABEL_PORT_INDEX) {
        Some(raw) => parse_index(raw, ports.len()).map_err(|e| EndpointError::PortIndex {
            count: ports.len(),
            source: Box::new(e),
        })?,
        None => 0,
    };

    let port = ports[index];
    u16::try_from(port).map_err(|_| EndpointError::PortOutOfRange(i64::from(port)))
}

/// Ports the task can be reached on. The first non-empty source wins:
/// task ports, then port definitions, then IP-per-task discovery ports.
pub fn available_ports(app: &Application, task: &Task) -> Vec<u32> {
    if !task.ports.is_empty() {
        return task.ports.clone();
    }

    if let Some(definitions) = app.port_definitions.as_ref().filter(|d| !d.is_empty()) {
        return definitions.iter().filter_map(|d| d.port).collect();
    }

    app.ip_address_per_task
        .as_ref()
        .map(|per_task| per_task.discovery_ports())
        .unwrap_or_default()
}

/// Resolve the host or IP traffic should be sent to.
pub fn resolve_address(
    app: &Application,
    task: &Task,
    force_task_hostname: bool,
) -> Result<String, EndpointError> {
    if app.ip_address_per_task.is_none() || force_task_hostname {
        return Ok(task.host.clone());
    }

    match task.ip_addresses.as_slice() {
        [] => Err(EndpointError::NoIpAddress),
        [only] => Ok(only.ip_address.clone()),
        addresses => {
            let count = addresses.len();
            let raw = app
                .labels()
                .get(LABEL_IP_ADDRESS_INDEX)
                .ok_or(EndpointError::MissingIpAddressIndex(count))?;
            let index = parse_index(raw, count).map_err(|e| EndpointError::IpAddressIndex {
                count,
                source: Box::new(e),
            })?;
            Ok(addresses[index].ip_address.clone())
        }
    }
}

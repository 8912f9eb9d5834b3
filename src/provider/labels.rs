//! Label lookup with typed defaults.
//!
//! Every routing field is read through [`Labels::get_or`]: a missing label
//! yields the documented default, a malformed one is logged and also yields
//! the default. Nothing here fails.

use std::collections::HashMap;

pub const LABEL_ENABLE: &str = "traefik.enable";
pub const LABEL_TAGS: &str = "traefik.tags";
pub const LABEL_PORT: &str = "traefik.port";
pub const LABEL_PORT_INDEX: &str = "traefik.portIndex";
pub const LABEL_IP_ADDRESS_INDEX: &str = "traefik.ipAddressIdx";
pub const LABEL_PROTOCOL: &str = "traefik.protocol";
pub const LABEL_WEIGHT: &str = "traefik.weight";
pub const LABEL_DOMAIN: &str = "traefik.domain";
pub const LABEL_BACKEND: &str = "traefik.backend";
pub const LABEL_BACKEND_CIRCUIT_BREAKER_EXPRESSION: &str = "traefik.backend.circuitbreaker.expression";
pub const LABEL_BACKEND_HEALTH_CHECK_PATH: &str = "traefik.backend.healthcheck.path";
pub const LABEL_BACKEND_HEALTH_CHECK_INTERVAL: &str = "traefik.backend.healthcheck.interval";
pub const LABEL_BACKEND_LOAD_BALANCER_METHOD: &str = "traefik.backend.loadbalancer.method";
pub const LABEL_BACKEND_LOAD_BALANCER_STICKY: &str = "traefik.backend.loadbalancer.sticky";
pub const LABEL_BACKEND_MAX_CONN_AMOUNT: &str = "traefik.backend.maxconn.amount";
pub const LABEL_BACKEND_MAX_CONN_EXTRACTOR_FUNC: &str = "traefik.backend.maxconn.extractorfunc";
pub const LABEL_FRONTEND_AUTH_BASIC: &str = "traefik.frontend.auth.basic";
pub const LABEL_FRONTEND_ENTRY_POINTS: &str = "traefik.frontend.entryPoints";
pub const LABEL_FRONTEND_PASS_HOST_HEADER: &str = "traefik.frontend.passHostHeader";
pub const LABEL_FRONTEND_PRIORITY: &str = "traefik.frontend.priority";
pub const LABEL_FRONTEND_RULE: &str = "traefik.frontend.rule";

/// marathon-lb group label, used as an extra constraint tag in compatibility mode.
pub const LABEL_HAPROXY_GROUP: &str = "HAPROXY_GROUP";
/// marathon-lb virtual host label, used as a host rule in compatibility mode.
pub const LABEL_HAPROXY_VHOST: &str = "HAPROXY_0_VHOST";

pub const DEFAULT_WEIGHT: i32 = 0;
pub const DEFAULT_PRIORITY: i32 = 0;
pub const DEFAULT_PROTOCOL: &str = "http";
pub const DEFAULT_STICKY: bool = false;
pub const DEFAULT_PASS_HOST_HEADER: bool = true;
pub const DEFAULT_LOAD_BALANCER_METHOD: &str = "wrr";
pub const DEFAULT_CIRCUIT_BREAKER_EXPRESSION: &str = "NetworkErrorRatio() > 1";
pub const DEFAULT_MAX_CONN_AMOUNT: i64 = i64::MAX;
pub const DEFAULT_MAX_CONN_EXTRACTOR_FUNC: &str = "request.host";

/// A value that can be read from a label string.
pub trait LabelValue: Sized {
    /// `None` means the raw text is malformed for this type.
    fn parse_label(raw: &str) -> Option<Self>;
}

impl LabelValue for String {
    fn parse_label(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }
}

impl LabelValue for bool {
    fn parse_label(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl LabelValue for i32 {
    fn parse_label(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

impl LabelValue for i64 {
    fn parse_label(raw: &str) -> Option<Self> {
        raw.trim().parse().ok()
    }
}

/// Comma-separated list.
impl LabelValue for Vec<String> {
    fn parse_label(raw: &str) -> Option<Self> {
        Some(raw.split(',').map(str::to_string).collect())
    }
}

/// Read-only view over an entity's label mapping.
#[derive(Debug, Clone, Copy)]
pub struct Labels<'a> {
    map: Option<&'a HashMap<String, String>>,
}

impl<'a> Labels<'a> {
    pub fn new(map: Option<&'a HashMap<String, String>>) -> Self {
        Self { map }
    }

    /// Raw lookup. A missing mapping never finds anything.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.map.and_then(|m| m.get(key)).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Typed lookup falling back to `default` when absent or malformed.
    pub fn get_or<T: LabelValue>(&self, key: &str, default: T) -> T {
        self.get_or_else(key, || default)
    }

    /// Like [`Labels::get_or`] with a lazily computed default.
    pub fn get_or_else<T: LabelValue>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        match self.get(key) {
            None => default(),
            Some(raw) => T::parse_label(raw).unwrap_or_else(|| {
                tracing::warn!(label = key, value = raw, "Unable to parse label value, using default");
                default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_missing_mapping_finds_nothing() {
        let labels = Labels::new(None);
        assert_eq!(labels.get(LABEL_WEIGHT), None);
        assert_eq!(labels.get_or(LABEL_WEIGHT, DEFAULT_WEIGHT), 0);
        assert_eq!(labels.get_or(LABEL_PROTOCOL, DEFAULT_PROTOCOL.to_string()), "http");
    }

    #[test]
    fn test_present_values_win() {
        let m = map(&[
            (LABEL_WEIGHT, "10"),
            (LABEL_FRONTEND_PASS_HOST_HEADER, "false"),
            (LABEL_FRONTEND_ENTRY_POINTS, "http,https"),
        ]);
        let labels = Labels::new(Some(&m));
        assert_eq!(labels.get_or(LABEL_WEIGHT, DEFAULT_WEIGHT), 10);
        assert!(!labels.get_or(LABEL_FRONTEND_PASS_HOST_HEADER, DEFAULT_PASS_HOST_HEADER));
        assert_eq!(
            labels.get_or(LABEL_FRONTEND_ENTRY_POINTS, Vec::<String>::new()),
            vec!["http", "https"]
        );
    }

    #[test]
    fn test_malformed_values_degrade_to_default() {
        let m = map(&[(LABEL_BACKEND_MAX_CONN_AMOUNT, "lots"), (LABEL_BACKEND_LOAD_BALANCER_STICKY, "yes")]);
        let labels = Labels::new(Some(&m));
        assert_eq!(labels.get_or(LABEL_BACKEND_MAX_CONN_AMOUNT, DEFAULT_MAX_CONN_AMOUNT), i64::MAX);
        assert!(!labels.get_or(LABEL_BACKEND_LOAD_BALANCER_STICKY, DEFAULT_STICKY));
    }

    #[test]
    fn test_empty_value_is_present() {
        let m = map(&[(LABEL_DOMAIN, "")]);
        let labels = Labels::new(Some(&m));
        assert!(labels.contains(LABEL_DOMAIN));
        assert_eq!(labels.get_or_else(LABEL_DOMAIN, || "fallback".to_string()), "");
    }
}

//! Routing configuration synthesis from a filtered snapshot.
//!
//! # Responsibilities
//! - Derive every backend and frontend field from labels and provider defaults
//! - Resolve one server per eligible task
//! - Emit a backend for every application, even one without servers
//!
//! # Design Decisions
//! - A task whose endpoint cannot be resolved is skipped, never the whole cycle
//! - Optional backend sections only appear when their labels are present
//! - Output maps are ordered, so equal snapshots give equal configurations

use crate::config::DiscoveryConfig;
use crate::provider::endpoint::{resolve_address, resolve_port};
use crate::provider::labels::*;
use crate::registry::{Application, Task};
use crate::routing::{
    Backend, CircuitBreaker, Frontend, HealthCheck, LoadBalancer, MaxConn, Route,
    RoutingConfiguration, Server,
};

/// Builds a [`RoutingConfiguration`] from filtered applications.
#[derive(Debug, Clone)]
pub struct ConfigSynthesizer<'a> {
    config: &'a DiscoveryConfig,
}

impl<'a> ConfigSynthesizer<'a> {
    pub fn new(config: &'a DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn synthesize(&self, apps: &[Application]) -> RoutingConfiguration {
        let mut configuration = RoutingConfiguration::default();

        for app in apps {
            let backend_name = format!("backend{}", self.backend(app));
            let backend = configuration.backends.entry(backend_name.clone()).or_default();

            for task in &app.tasks {
                if let Some(server) = self.server(app, task) {
                    backend.servers.insert(server_name(task), server);
                }
            }
            self.apply_backend_sections(app, backend);

            let flat_id = app.id.replace('/', "-");
            let mut frontend = Frontend {
                backend: backend_name,
                entry_points: self.entry_points(app),
                pass_host_header: self.pass_host_header(app),
                priority: self.priority(app),
                basic_auth: self.basic_auth(app),
                ..Default::default()
            };
            frontend.routes.insert(
                format!("route-host{}", flat_id),
                Route { rule: self.frontend_rule(app) },
            );
            configuration.frontends.insert(format!("frontend{}", flat_id), frontend);
        }

        configuration
    }

    fn server(&self, app: &Application, task: &Task) -> Option<Server> {
        let address = match resolve_address(app, task, self.config.force_task_hostname) {
            Ok(address) => address,
            Err(e) => {
                tracing::error!(app = %app.id, task = %task.id, error = %e, "Unable to resolve task address");
                return None;
            }
        };
        let port = match resolve_port(app, task) {
            Ok(port) => port,
            Err(e) => {
                tracing::error!(app = %app.id, task = %task.id, error = %e, "Unable to process ports");
                return None;
            }
        };

        Some(Server {
            url: format!("{}://{}:{}", self.protocol(app), address, port),
            weight: self.weight(app),
        })
    }

    /// Optional sections; when several applications share a backend the first one sets them.
    fn apply_backend_sections(&self, app: &Application, backend: &mut Backend) {
        let labels = app.labels();

        if backend.load_balancer.is_none()
            && (labels.contains(LABEL_BACKEND_LOAD_BALANCER_METHOD)
                || labels.contains(LABEL_BACKEND_LOAD_BALANCER_STICKY))
        {
            backend.load_balancer = Some(LoadBalancer {
                method: self.load_balancer_method(app),
                sticky: self.sticky(app),
            });
        }

        if backend.circuit_breaker.is_none() && labels.contains(LABEL_BACKEND_CIRCUIT_BREAKER_EXPRESSION) {
            backend.circuit_breaker = Some(CircuitBreaker {
                expression: self.circuit_breaker_expression(app),
            });
        }

        if backend.max_conn.is_none()
            && labels.contains(LABEL_BACKEND_MAX_CONN_AMOUNT)
            && labels.contains(LABEL_BACKEND_MAX_CONN_EXTRACTOR_FUNC)
        {
            backend.max_conn = Some(MaxConn {
                amount: self.max_conn_amount(app),
                extractor_func: self.max_conn_extractor_func(app),
            });
        }

        let path = self.health_check_path(app);
        if backend.health_check.is_none() && !path.is_empty() {
            backend.health_check = Some(HealthCheck {
                path,
                interval: self.health_check_interval(app),
            });
        }
    }

    pub fn backend(&self, app: &Application) -> String {
        app.labels()
            .get_or_else(LABEL_BACKEND, || app.id.replace('/', "-"))
    }

    pub fn domain(&self, app: &Application) -> String {
        app.labels()
            .get_or_else(LABEL_DOMAIN, || self.config.domain.clone())
    }

    /// `/group/app` becomes `app.group` with groups as subdomains, `group-app` otherwise.
    pub fn sub_domain(&self, id: &str) -> String {
        let trimmed = id.strip_prefix('/').unwrap_or(id);
        if self.config.groups_as_subdomains {
            trimmed.split('/').rev().collect::<Vec<_>>().join(".")
        } else {
            trimmed.replace('/', "-")
        }
    }

    /// Explicit rule label, then the marathon-lb vhost, then a host rule.
    /// The generated host rule uses the app's `traefik.domain` label when set,
    /// not only the configured domain.
    pub fn frontend_rule(&self, app: &Application) -> String {
        let labels = app.labels();
        if let Some(rule) = labels.get(LABEL_FRONTEND_RULE) {
            return rule.to_string();
        }
        if self.config.marathon_lb_compatibility {
            if let Some(vhost) = labels.get(LABEL_HAPROXY_VHOST) {
                return format!("Host:{}", vhost);
            }
        }
        format!("Host:{}.{}", self.sub_domain(&app.id), self.domain(app))
    }

    pub fn weight(&self, app: &Application) -> i32 {
        app.labels().get_or(LABEL_WEIGHT, DEFAULT_WEIGHT)
    }

    pub fn priority(&self, app: &Application) -> i32 {
        app.labels().get_or(LABEL_FRONTEND_PRIORITY, DEFAULT_PRIORITY)
    }

    pub fn protocol(&self, app: &Application) -> String {
        app.labels().get_or(LABEL_PROTOCOL, DEFAULT_PROTOCOL.to_string())
    }

    pub fn pass_host_header(&self, app: &Application) -> bool {
        app.labels().get_or(LABEL_FRONTEND_PASS_HOST_HEADER, DEFAULT_PASS_HOST_HEADER)
    }

    pub fn sticky(&self, app: &Application) -> bool {
        app.labels().get_or(LABEL_BACKEND_LOAD_BALANCER_STICKY, DEFAULT_STICKY)
    }

    pub fn entry_points(&self, app: &Application) -> Vec<String> {
        app.labels().get_or(LABEL_FRONTEND_ENTRY_POINTS, Vec::new())
    }

    pub fn basic_auth(&self, app: &Application) -> Vec<String> {
        app.labels().get_or(LABEL_FRONTEND_AUTH_BASIC, Vec::new())
    }

    pub fn load_balancer_method(&self, app: &Application) -> String {
        app.labels()
            .get_or(LABEL_BACKEND_LOAD_BALANCER_METHOD, DEFAULT_LOAD_BALANCER_METHOD.to_string())
    }

    pub fn circuit_breaker_expression(&self, app: &Application) -> String {
        app.labels().get_or(
            LABEL_BACKEND_CIRCUIT_BREAKER_EXPRESSION,
            DEFAULT_CIRCUIT_BREAKER_EXPRESSION.to_string(),
        )
    }

    pub fn max_conn_amount(&self, app: &Application) -> i64 {
        app.labels().get_or(LABEL_BACKEND_MAX_CONN_AMOUNT, DEFAULT_MAX_CONN_AMOUNT)
    }

    pub fn max_conn_extractor_func(&self, app: &Application) -> String {
        app.labels().get_or(
            LABEL_BACKEND_MAX_CONN_EXTRACTOR_FUNC,
            DEFAULT_MAX_CONN_EXTRACTOR_FUNC.to_string(),
        )
    }

    pub fn health_check_path(&self, app: &Application) -> String {
        app.labels().get_or(LABEL_BACKEND_HEALTH_CHECK_PATH, String::new())
    }

    pub fn health_check_interval(&self, app: &Application) -> String {
        app.labels().get_or(LABEL_BACKEND_HEALTH_CHECK_INTERVAL, String::new())
    }
}

fn server_name(task: &Task) -> String {
    format!("server-{}", task.id.replace('.', "-"))
}

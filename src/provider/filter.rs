//! Application and task eligibility.
//!
//! # Responsibilities
//! - Drop disabled applications and those pruned by constraints
//! - Drop tasks that are not running, have no usable port, or failed health checks
//! - Produce a new filtered snapshot; the fetched one is never modified

use crate::config::DiscoveryConfig;
use crate::provider::constraints::match_constraints;
use crate::provider::endpoint::resolve_port;
use crate::provider::labels::{LABEL_ENABLE, LABEL_HAPROXY_GROUP, LABEL_PORT, LABEL_PORT_INDEX, LABEL_TAGS};
use crate::registry::{Application, Task};

/// Decides which applications and tasks are exposed.
#[derive(Debug, Clone)]
pub struct InstanceFilter<'a> {
    config: &'a DiscoveryConfig,
}

impl<'a> InstanceFilter<'a> {
    pub fn new(config: &'a DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Keep enabled applications whose tags satisfy every constraint.
    pub fn application_filter(&self, app: &Application) -> bool {
        if !is_application_enabled(app, self.config.exposed_by_default) {
            tracing::debug!(app = %app.id, "Filtering disabled Marathon application");
            return false;
        }

        let labels = app.labels();
        // An absent label still yields one empty tag, so `tag==*` admits untagged apps.
        let mut tags: Vec<String> = labels
            .get(LABEL_TAGS)
            .unwrap_or("")
            .split(',')
            .map(str::to_string)
            .collect();
        if self.config.marathon_lb_compatibility {
            if let Some(group) = labels.get(LABEL_HAPROXY_GROUP) {
                tags.push(group.to_string());
            }
        }

        if let Err(failing) = match_constraints(&self.config.constraints, &tags) {
            tracing::debug!(app = %app.id, constraint = %failing, "Filtering Marathon application pruned by constraint");
            return false;
        }

        true
    }

    /// Keep running tasks with a resolvable port and no failed health check.
    pub fn task_filter(&self, task: &Task, app: &Application) -> bool {
        if !task.is_running() {
            return false;
        }

        if let Err(e) = resolve_port(app, task) {
            tracing::error!(task = %task.id, app = %app.id, error = %e, "Filtering Marathon task without port");
            return false;
        }

        let labels = app.labels();
        if labels.contains(LABEL_PORT) && labels.contains(LABEL_PORT_INDEX) {
            tracing::debug!(
                task = %task.id,
                app = %app.id,
                "Filtering Marathon task specifying both {} and {} labels",
                LABEL_PORT_INDEX,
                LABEL_PORT
            );
            return false;
        }

        if app.has_health_checks()
            && task.has_health_check_results()
            && task.health_check_results.iter().any(|result| !result.alive)
        {
            tracing::debug!(task = %task.id, app = %app.id, "Filtering Marathon task with bad health check");
            return false;
        }

        true
    }

    /// Filter a snapshot into a new collection of eligible applications,
    /// each carrying only its eligible tasks.
    pub fn filter_applications(&self, apps: &[Application]) -> Vec<Application> {
        apps.iter()
            .filter(|app| self.application_filter(app))
            .map(|app| Application {
                tasks: app
                    .tasks
                    .iter()
                    .filter(|task| self.task_filter(task, app))
                    .cloned()
                    .collect(),
                ..app.clone()
            })
            .collect()
    }
}

/// An explicit `"false"` always disables and an explicit `"true"` always
/// enables; anything else follows `exposed_by_default`.
pub fn is_application_enabled(app: &Application, exposed_by_default: bool) -> bool {
    let enable = app.labels().get(LABEL_ENABLE);
    exposed_by_default && enable != Some("false") || enable == Some("true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::types::{HealthCheck, HealthCheckResult, TASK_RUNNING, TASK_STAGING};

    fn app(labels: &[(&str, &str)]) -> Application {
        Application {
            id: "/app".to_string(),
            labels: Some(labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()),
            ..Default::default()
        }
    }

    fn running_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            host: "10.0.0.1".to_string(),
            ports: vec![80],
            state: TASK_RUNNING.to_string(),
            ..Default::default()
        }
    }

    fn results(alive: &[bool]) -> Vec<HealthCheckResult> {
        alive.iter().map(|a| HealthCheckResult { alive: *a }).collect()
    }

    #[test]
    fn test_enable_truth_table() {
        let cases = [
            (true, None, true),
            (true, Some("true"), true),
            (true, Some("false"), false),
            (true, Some("maybe"), true),
            (false, None, false),
            (false, Some("true"), true),
            (false, Some("false"), false),
            (false, Some("maybe"), false),
        ];
        for (exposed, label, expected) in cases {
            let application = match label {
                Some(value) => app(&[(LABEL_ENABLE, value)]),
                None => app(&[]),
            };
            assert_eq!(
                is_application_enabled(&application, exposed),
                expected,
                "exposed_by_default={} label={:?}",
                exposed,
                label
            );
        }

        let unlabeled = Application { id: "/bare".to_string(), ..Default::default() };
        assert!(is_application_enabled(&unlabeled, true));
        assert!(!is_application_enabled(&unlabeled, false));
    }

    #[test]
    fn test_constraints_on_tags() {
        let config = DiscoveryConfig {
            constraints: vec!["tag==api".parse().unwrap()],
            ..Default::default()
        };
        let filter = InstanceFilter::new(&config);
        assert!(filter.application_filter(&app(&[(LABEL_TAGS, "web,api")])));
        assert!(!filter.application_filter(&app(&[(LABEL_TAGS, "web")])));
        assert!(!filter.application_filter(&app(&[])));
    }

    #[test]
    fn test_untagged_app_under_glob_constraints() {
        let untagged = app(&[]);

        let config = DiscoveryConfig {
            constraints: vec!["tag==*".parse().unwrap()],
            ..Default::default()
        };
        assert!(InstanceFilter::new(&config).application_filter(&untagged));

        let config = DiscoveryConfig {
            constraints: vec!["tag!=*".parse().unwrap()],
            ..Default::default()
        };
        assert!(!InstanceFilter::new(&config).application_filter(&untagged));
    }

    #[test]
    fn test_haproxy_group_counts_in_compatibility_mode() {
        let mut config = DiscoveryConfig {
            constraints: vec!["tag==external".parse().unwrap()],
            ..Default::default()
        };
        let application = app(&[(LABEL_HAPROXY_GROUP, "external")]);
        assert!(!InstanceFilter::new(&config).application_filter(&application));

        config.marathon_lb_compatibility = true;
        assert!(InstanceFilter::new(&config).application_filter(&application));
    }

    #[test]
    fn test_only_running_tasks() {
        let config = DiscoveryConfig::default();
        let filter = InstanceFilter::new(&config);
        let application = app(&[]);

        assert!(filter.task_filter(&running_task("app.1"), &application));

        let mut staging = running_task("app.2");
        staging.state = TASK_STAGING.to_string();
        assert!(!filter.task_filter(&staging, &application));
    }

    #[test]
    fn test_task_without_port_excluded() {
        let config = DiscoveryConfig::default();
        let filter = InstanceFilter::new(&config);
        let mut task = running_task("app.1");
        task.ports.clear();
        assert!(!filter.task_filter(&task, &app(&[])));
    }

    #[test]
    fn test_port_and_port_index_conflict_excludes_all_tasks() {
        let config = DiscoveryConfig::default();
        let filter = InstanceFilter::new(&config);
        let mut application = app(&[(LABEL_PORT, "8080"), (LABEL_PORT_INDEX, "0")]);
        application.tasks = vec![running_task("app.1"), running_task("app.2"), running_task("app.3")];

        let filtered = filter.filter_applications(std::slice::from_ref(&application));
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].tasks.is_empty());
    }

    #[test]
    fn test_health_check_veto() {
        let config = DiscoveryConfig::default();
        let filter = InstanceFilter::new(&config);
        let mut application = app(&[]);
        application.health_checks = Some(vec![HealthCheck::default()]);

        let mut task = running_task("app.1");
        task.health_check_results = results(&[true, false, true]);
        assert!(!filter.task_filter(&task, &application));

        task.health_check_results = results(&[true, true]);
        assert!(filter.task_filter(&task, &application));

        task.health_check_results.clear();
        assert!(filter.task_filter(&task, &application));

        // Results are ignored when the application declares no health checks.
        application.health_checks = None;
        task.health_check_results = results(&[false]);
        assert!(filter.task_filter(&task, &application));
    }

    #[test]
    fn test_filter_leaves_snapshot_untouched() {
        let config = DiscoveryConfig::default();
        let filter = InstanceFilter::new(&config);
        let mut staging = running_task("app.2");
        staging.state = TASK_STAGING.to_string();

        let mut application = app(&[]);
        application.tasks = vec![running_task("app.1"), staging];
        let mut disabled = app(&[(LABEL_ENABLE, "false")]);
        disabled.id = "/disabled".to_string();

        let snapshot = vec![application, disabled];
        let filtered = filter.filter_applications(&snapshot);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].tasks.len(), 1);
        assert_eq!(snapshot[0].tasks.len(), 2);
    }
}

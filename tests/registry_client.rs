//! HTTP registry client against a scripted Marathon.

use std::time::Duration;

use marathon_provider::config::{BasicAuthConfig, RegistryConfig};
use marathon_provider::registry::{
    ApplicationQuery, HttpRegistryClient, RegistryClient, RegistryError,
};

mod common;

use common::{MockMarathon, WHOAMI_APPS};

fn registry_config(endpoint: String) -> RegistryConfig {
    RegistryConfig {
        endpoint,
        dialer_timeout_secs: 1,
        response_timeout_secs: 2,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_list_applications_with_tasks() {
    let marathon = MockMarathon::start().await;
    marathon.set_apps(WHOAMI_APPS);

    let client = HttpRegistryClient::new(&registry_config(marathon.url())).unwrap();
    let apps = client.applications(&ApplicationQuery::with_tasks()).await.unwrap();

    assert_eq!(apps.len(), 2);
    assert_eq!(apps[0].id, "/whoami");
    assert_eq!(apps[0].tasks.len(), 2);
    assert_eq!(apps[0].tasks[1].ports, vec![31002]);

    let requests = marathon.requests();
    assert!(requests[0].starts_with("GET /v2/apps?embed=apps.tasks "));
}

#[tokio::test]
async fn test_ping() {
    let marathon = MockMarathon::start().await;
    let client = HttpRegistryClient::new(&registry_config(marathon.url())).unwrap();

    client.ping().await.unwrap();
    assert!(marathon.requests()[0].starts_with("GET /ping "));
}

#[tokio::test]
async fn test_failover_to_next_endpoint() {
    let marathon = MockMarathon::start().await;
    marathon.set_apps(WHOAMI_APPS);

    // Nothing listens on port 1.
    let endpoints = format!("http://127.0.0.1:1, {}/", marathon.url());
    let client = HttpRegistryClient::new(&registry_config(endpoints)).unwrap();
    let apps = client.applications(&ApplicationQuery::with_tasks()).await.unwrap();

    assert_eq!(apps.len(), 2);
}

#[tokio::test]
async fn test_all_endpoints_failing() {
    let marathon = MockMarathon::start().await;
    marathon.fail_apps(500);

    let endpoints = format!("http://127.0.0.1:1,{}", marathon.url());
    let client = HttpRegistryClient::new(&registry_config(endpoints)).unwrap();
    let result = client.applications(&ApplicationQuery::with_tasks()).await;

    match result {
        Err(RegistryError::AllEndpointsFailed(last)) => assert!(last.contains("500")),
        other => panic!("expected AllEndpointsFailed, got {:?}", other.map(|apps| apps.len())),
    }
}

#[tokio::test]
async fn test_token_authorization_header() {
    let marathon = MockMarathon::start().await;
    let mut config = registry_config(marathon.url());
    config.dcos_token = Some("secret-token".to_string());
    config.basic = Some(BasicAuthConfig {
        http_basic_auth_user: "user".to_string(),
        http_basic_password: "pass".to_string(),
    });

    let client = HttpRegistryClient::new(&config).unwrap();
    client.ping().await.unwrap();

    let head = marathon.requests()[0].to_lowercase();
    assert!(head.contains("authorization: token=secret-token"), "{}", head);
    assert!(!head.contains("authorization: basic"));
}

#[tokio::test]
async fn test_basic_authorization_header() {
    let marathon = MockMarathon::start().await;
    let mut config = registry_config(marathon.url());
    config.basic = Some(BasicAuthConfig {
        http_basic_auth_user: "user".to_string(),
        http_basic_password: "pass".to_string(),
    });

    let client = HttpRegistryClient::new(&config).unwrap();
    client.ping().await.unwrap();

    // base64("user:pass")
    let head = marathon.requests()[0].to_lowercase();
    assert!(head.contains("authorization: basic dxnlcjpwyxnz"), "{}", head);
}

#[tokio::test]
async fn test_subscription_delivers_application_events_only() {
    let marathon = MockMarathon::start().await;
    let client = HttpRegistryClient::new(&registry_config(marathon.url())).unwrap();

    let mut events = client.subscribe().await.unwrap();
    marathon.wait_for_subscriber().await;

    marathon.emit("framework_message_event");
    marathon.emit("deployment_success");

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.event_type, "deployment_success");
    assert_eq!(event.data, r#"{"eventType":"deployment_success"}"#);

    let head = marathon.requests()[0].to_lowercase();
    assert!(head.starts_with("get /v2/events?event_type=api_post_event&event_type="));
    assert!(head.contains("accept: text/event-stream"));
}

#[tokio::test]
async fn test_dropping_subscription_closes_stream() {
    let marathon = MockMarathon::start().await;
    let client = HttpRegistryClient::new(&registry_config(marathon.url())).unwrap();

    let events = client.subscribe().await.unwrap();
    marathon.wait_for_subscriber().await;
    drop(events);

    // The mock notices the closed socket on its next write.
    tokio::time::timeout(Duration::from_secs(5), async {
        while marathon.subscribers() > 0 {
            marathon.emit("status_update_event");
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

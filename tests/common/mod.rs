//! Shared utilities for integration testing: a scripted Marathon registry.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

#[derive(Clone)]
struct State {
    apps: Arc<Mutex<(u16, String)>>,
    requests: Arc<Mutex<Vec<String>>>,
    events: broadcast::Sender<String>,
}

/// Mock Marathon answering `/ping`, `/v2/apps` and streaming `/v2/events`.
pub struct MockMarathon {
    pub addr: SocketAddr,
    state: State,
}

impl MockMarathon {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (events, _) = broadcast::channel(16);
        let state = State {
            apps: Arc::new(Mutex::new((200, r#"{"apps":[]}"#.to_string()))),
            requests: Arc::new(Mutex::new(Vec::new())),
            events,
        };

        let shared = state.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let state = shared.clone();
                        tokio::spawn(handle(socket, state));
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Body served by `/v2/apps` from now on.
    pub fn set_apps(&self, json: &str) {
        *self.state.apps.lock().unwrap() = (200, json.to_string());
    }

    /// Make `/v2/apps` answer with an error status.
    pub fn fail_apps(&self, status: u16) {
        self.state.apps.lock().unwrap().0 = status;
    }

    /// Raw request heads received so far.
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Push an event to every open `/v2/events` stream.
    pub fn emit(&self, event_type: &str) {
        let frame = format!("event: {}\ndata: {{\"eventType\":\"{}\"}}\n\n", event_type, event_type);
        let _ = self.state.events.send(frame);
    }

    /// Number of open event streams.
    pub fn subscribers(&self) -> usize {
        self.state.events.receiver_count()
    }

    /// Wait until a request whose head starts with `prefix` has been answered.
    pub async fn wait_for_request(&self, prefix: &str) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.requests().iter().any(|head| head.starts_with(prefix)) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("request never arrived");
    }

    pub async fn wait_for_subscriber(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.subscribers() == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("no event subscriber connected");
    }
}

async fn handle(mut socket: TcpStream, state: State) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf).to_string();
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

    if path.starts_with("/v2/events") {
        state.requests.lock().unwrap().push(head);
        let mut events = state.events.subscribe();
        let header = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\n\r\n";
        if socket.write_all(header.as_bytes()).await.is_err() {
            return;
        }
        // Comment lines must be ignored by the client.
        let _ = socket.write_all(b": connected\n\n").await;
        while let Ok(frame) = events.recv().await {
            if socket.write_all(frame.as_bytes()).await.is_err() {
                return;
            }
        }
        return;
    }

    let (status, body) = if path.starts_with("/v2/apps") {
        state.apps.lock().unwrap().clone()
    } else if path.starts_with("/ping") {
        (200, "pong".to_string())
    } else {
        (404, "not found".to_string())
    };
    // Recorded once the answer is fixed.
    state.requests.lock().unwrap().push(head);

    let status_text = match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// The whoami application: two running tasks on one host.
pub const WHOAMI_APPS: &str = r#"{
  "apps": [
    {
      "id": "/whoami",
      "labels": {"traefik.frontend.entryPoints": "http,https"},
      "portDefinitions": [{"port": 10000, "protocol": "tcp"}],
      "tasks": [
        {"id": "whoami.1", "appId": "/whoami", "host": "10.0.0.1", "ports": [31001], "state": "TASK_RUNNING"},
        {"id": "whoami.2", "appId": "/whoami", "host": "10.0.0.2", "ports": [31002], "state": "TASK_RUNNING"}
      ]
    },
    {
      "id": "/internal/db",
      "labels": {"traefik.enable": "false"},
      "tasks": [
        {"id": "internal_db.1", "appId": "/internal/db", "host": "10.0.0.3", "ports": [5432], "state": "TASK_RUNNING"}
      ]
    }
  ]
}"#;

/// The whoami application scaled to three tasks, one still staging.
pub const WHOAMI_SCALED_APPS: &str = r#"{
  "apps": [
    {
      "id": "/whoami",
      "tasks": [
        {"id": "whoami.1", "appId": "/whoami", "host": "10.0.0.1", "ports": [31001], "state": "TASK_RUNNING"},
        {"id": "whoami.2", "appId": "/whoami", "host": "10.0.0.2", "ports": [31002], "state": "TASK_RUNNING"},
        {"id": "whoami.3", "appId": "/whoami", "host": "10.0.0.4", "ports": [31003], "state": "TASK_STAGING"}
      ]
    }
  ]
}"#;

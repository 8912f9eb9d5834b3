//! HTTP client for the Marathon REST API with endpoint failover.
//!
//! # Responsibilities
//! - Build a reqwest client honouring timeouts, keep-alive and TLS settings
//! - Authenticate with a DC/OS token or HTTP basic auth
//! - List applications, ping, and stream change events
//! - Fail over across configured endpoints in order

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Certificate, Identity, RequestBuilder, Response};
use tokio::sync::mpsc;

use crate::config::{ClientTlsConfig, RegistryConfig};
use crate::registry::events::{EventStreamParser, RegistryEvent, APPLICATION_EVENTS};
use crate::registry::types::{Application, ApplicationList, ApplicationQuery};
use crate::registry::{ClientFactory, RegistryClient, RegistryError, RegistryResult};

/// Pending events buffered between the stream reader and the connector.
const EVENT_BUFFER: usize = 64;

/// Marathon REST client.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    http: reqwest::Client,
    endpoints: Vec<String>,
    auth: Auth,
    response_timeout: Duration,
}

#[derive(Debug, Clone)]
enum Auth {
    None,
    Token(String),
    Basic { user: String, password: String },
}

impl HttpRegistryClient {
    /// Build a client from configuration. No network traffic happens here.
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        let endpoints = config.endpoints();
        if endpoints.is_empty() {
            return Err(RegistryError::InvalidEndpoint(config.endpoint.clone()));
        }
        for endpoint in &endpoints {
            url::Url::parse(endpoint)
                .map_err(|e| RegistryError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        }

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.dialer_timeout_secs))
            .tcp_keepalive(Duration::from_secs(config.keep_alive_secs));
        if let Some(tls) = &config.tls {
            builder = apply_tls(builder, tls)?;
        }
        let http = builder.build()?;

        let auth = match (&config.dcos_token, &config.basic) {
            (Some(token), _) if !token.is_empty() => Auth::Token(token.clone()),
            (_, Some(basic)) => Auth::Basic {
                user: basic.http_basic_auth_user.clone(),
                password: basic.http_basic_password.clone(),
            },
            _ => Auth::None,
        };

        Ok(Self {
            http,
            endpoints,
            auth,
            response_timeout: Duration::from_secs(config.response_timeout_secs),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::None => request,
            Auth::Token(token) => match HeaderValue::from_str(&format!("token={}", token)) {
                Ok(value) => request.header(AUTHORIZATION, value),
                Err(_) => {
                    tracing::warn!("DC/OS token is not a valid header value, sending request unauthenticated");
                    request
                }
            },
            Auth::Basic { user, password } => request.basic_auth(user, Some(password)),
        }
    }

    /// Issue a GET against each endpoint in turn until one answers with success.
    async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        streaming: bool,
    ) -> RegistryResult<Response> {
        let mut last_error = None;

        for endpoint in &self.endpoints {
            let url = format!("{}{}", endpoint, path);
            let mut request = self.http.get(&url).query(query);
            if streaming {
                request = request.header(ACCEPT, "text/event-stream");
            } else {
                request = request.timeout(self.response_timeout);
            }

            match self.authorize(request).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    tracing::warn!(url = %url, status = %response.status(), "Registry returned error status, trying next endpoint");
                    last_error = Some(RegistryError::Status {
                        status: response.status().as_u16(),
                        url,
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Registry request failed, trying next endpoint");
                    last_error = Some(RegistryError::Http(e));
                }
            }
        }

        Err(RegistryError::AllEndpointsFailed(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn applications(&self, query: &ApplicationQuery) -> RegistryResult<Vec<Application>> {
        let response = self.get("/v2/apps", &query.to_pairs(), false).await?;
        let body = response.bytes().await?;
        let list: ApplicationList = serde_json::from_slice(&body)?;
        Ok(list.apps)
    }

    async fn ping(&self) -> RegistryResult<()> {
        self.get("/ping", &[], false).await?;
        Ok(())
    }

    async fn subscribe(&self) -> RegistryResult<mpsc::Receiver<RegistryEvent>> {
        let query: Vec<(&str, String)> = APPLICATION_EVENTS
            .iter()
            .map(|event| ("event_type", event.to_string()))
            .collect();
        let response = self.get("/v2/events", &query, true).await?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut parser = EventStreamParser::new();
            loop {
                tokio::select! {
                    _ = tx.closed() => {
                        tracing::debug!("Event subscriber dropped, closing stream");
                        break;
                    }
                    chunk = stream.next() => match chunk {
                        Some(Ok(bytes)) => {
                            for event in parser.push(&bytes) {
                                if !event.affects_applications() {
                                    continue;
                                }
                                if tx.send(event).await.is_err() {
                                    return;
                                }
                            }
                        }
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Event stream read failed");
                            break;
                        }
                        None => {
                            tracing::info!("Event stream ended by registry");
                            break;
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

fn apply_tls(
    mut builder: reqwest::ClientBuilder,
    tls: &ClientTlsConfig,
) -> RegistryResult<reqwest::ClientBuilder> {
    builder = builder.use_rustls_tls();

    if let Some(ca) = &tls.ca {
        let pem = read_pem(ca)?;
        let cert = Certificate::from_pem(&pem)
            .map_err(|e| RegistryError::Tls(format!("invalid CA certificate {}: {}", ca, e)))?;
        builder = builder.add_root_certificate(cert);
    }

    if let (Some(cert), Some(key)) = (&tls.cert, &tls.key) {
        let mut pem = read_pem(cert)?;
        pem.push(b'\n');
        pem.extend(read_pem(key)?);
        let identity = Identity::from_pem(&pem)
            .map_err(|e| RegistryError::Tls(format!("invalid client identity {}: {}", cert, e)))?;
        builder = builder.identity(identity);
    }

    if tls.insecure_skip_verify {
        tracing::warn!("Registry TLS certificate verification disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    Ok(builder)
}

fn read_pem(path: &str) -> RegistryResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| RegistryError::Tls(format!("cannot read {}: {}", path, e)))
}

/// Factory producing [`HttpRegistryClient`]s from the registry configuration.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: RegistryConfig,
}

impl HttpClientFactory {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(&self) -> RegistryResult<Arc<dyn RegistryClient>> {
        Ok(Arc::new(HttpRegistryClient::new(&self.config)?))
    }
}

//! Registry connection lifecycle and reconciliation loop.
//!
//! # State Machine
//! ```text
//! Disconnected → Connecting → (Subscribed) → Reconciling → Subscribed ...
//!      ↑              │ error                                  │ stream closed
//!      └── backoff ───┴────────────────────────────────────────┘
//! ```
//!
//! # Design Decisions
//! - Exactly one reconciliation in flight; events are handled in arrival order
//! - A failed fetch mid-session keeps the last published configuration
//! - Shutdown is raced against every wait, and drops any in-flight pass unpublished

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::config::{BackoffConfig, DiscoveryConfig, ProviderConfig};
use crate::lifecycle::WorkerPool;
use crate::observability::metrics::{self, ReconcileOutcome};
use crate::provider::filter::InstanceFilter;
use crate::provider::synthesis::ConfigSynthesizer;
use crate::provider::ProviderError;
use crate::registry::{
    Application, ApplicationQuery, ClientFactory, HttpClientFactory, RegistryClient, RegistryError,
};
use crate::resilience::Backoff;
use crate::routing::{ConfigMessage, RoutingConfiguration};

/// Name attached to every published configuration.
pub const PROVIDER_NAME: &str = "marathon";

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// One-shot mode published its configuration.
    Completed,
    /// The configuration consumer went away.
    ConsumerGone,
}

/// Marathon provider: discovers applications and publishes routing configurations.
pub struct Provider {
    discovery: DiscoveryConfig,
    backoff: BackoffConfig,
    factory: Arc<dyn ClientFactory>,
}

impl Provider {
    /// Provider talking to the registry over HTTP.
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_factory(config, Arc::new(HttpClientFactory::new(config.registry.clone())))
    }

    pub fn with_factory(config: &ProviderConfig, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            discovery: config.discovery.clone(),
            backoff: config.backoff.clone(),
            factory,
        }
    }

    /// Run the provider as a worker of `pool`, publishing on `tx`.
    pub fn provide(self, tx: mpsc::Sender<ConfigMessage>, pool: &mut WorkerPool) {
        pool.go(move |stop| self.run(tx, stop));
    }

    /// Connect, reconcile and keep reconnecting until `stop` fires.
    pub async fn run(self, tx: mpsc::Sender<ConfigMessage>, mut stop: broadcast::Receiver<()>) {
        let mut backoff = Backoff::new(&self.backoff);

        loop {
            let result = tokio::select! {
                biased;
                _ = stop.recv() => {
                    tracing::info!("Provider received shutdown signal");
                    return;
                }
                result = self.session(&tx, &mut backoff) => result,
            };

            match result {
                Ok(SessionEnd::Completed) => {
                    tracing::info!("Provider published configuration, not watching for changes");
                    return;
                }
                Ok(SessionEnd::ConsumerGone) => {
                    tracing::warn!("Configuration channel closed, stopping provider");
                    return;
                }
                Err(e) => {
                    metrics::record_connect_failure();
                    let delay = backoff.next_delay();
                    tracing::error!(error = %e, delay = ?delay, attempt = backoff.attempt(), "Provider connection error, retrying");

                    tokio::select! {
                        biased;
                        _ = stop.recv() => {
                            tracing::info!("Provider received shutdown signal");
                            return;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn session(
        &self,
        tx: &mpsc::Sender<ConfigMessage>,
        backoff: &mut Backoff,
    ) -> Result<SessionEnd, ProviderError> {
        let client = self.factory.connect()?;

        let mut events = if self.discovery.watch {
            Some(client.subscribe().await?)
        } else {
            None
        };

        let configuration = self.reconcile(client.as_ref()).await?;
        if !publish(tx, configuration).await {
            return Ok(SessionEnd::ConsumerGone);
        }
        backoff.reset();

        let Some(events) = events.as_mut() else {
            return Ok(SessionEnd::Completed);
        };

        while let Some(event) = events.recv().await {
            metrics::record_event();
            tracing::debug!(event_type = %event.event_type, "Provider event received");

            match self.reconcile(client.as_ref()).await {
                Ok(configuration) => {
                    if !publish(tx, configuration).await {
                        return Ok(SessionEnd::ConsumerGone);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to retrieve Marathon applications, keeping last configuration");
                }
            }
        }

        Err(ProviderError::SubscriptionClosed)
    }

    /// Fetch a snapshot and turn it into a routing configuration.
    pub async fn reconcile(
        &self,
        client: &dyn RegistryClient,
    ) -> Result<RoutingConfiguration, RegistryError> {
        let apps = client
            .applications(&ApplicationQuery::with_tasks())
            .await
            .inspect_err(|_| metrics::record_reconciliation(ReconcileOutcome::FetchFailed))?;
        Ok(self.build_configuration(&apps))
    }

    /// Filter and synthesize; pure over the snapshot.
    pub fn build_configuration(&self, apps: &[Application]) -> RoutingConfiguration {
        let filtered = InstanceFilter::new(&self.discovery).filter_applications(apps);
        ConfigSynthesizer::new(&self.discovery).synthesize(&filtered)
    }
}

/// Hand a configuration to the consumer. Returns false once the consumer is gone.
async fn publish(tx: &mpsc::Sender<ConfigMessage>, configuration: RoutingConfiguration) -> bool {
    let backends = configuration.backends.len();
    let servers = configuration.server_count();
    tracing::info!(
        backends,
        frontends = configuration.frontends.len(),
        servers,
        "Publishing configuration"
    );

    let message = ConfigMessage {
        provider_name: PROVIDER_NAME.to_string(),
        configuration,
    };
    if tx.send(message).await.is_err() {
        return false;
    }

    metrics::record_reconciliation(ReconcileOutcome::Published);
    metrics::record_configuration(backends, servers);
    true
}

//! Registry subsystem: the orchestrator's view of applications and tasks.
//!
//! # Data Flow
//! ```text
//! ClientFactory::connect()
//!     → RegistryClient (client.rs, HTTP + failover)
//!         → applications()  → Vec<Application> (types.rs)
//!         → subscribe()     → mpsc::Receiver<RegistryEvent> (events.rs)
//!         → ping()
//! ```
//!
//! # Design Decisions
//! - The provider only talks to the `RegistryClient` trait; tests swap in fakes
//! - Snapshots are plain owned values, immutable once fetched
//! - Event subscription ends when the receiver is dropped

pub mod client;
pub mod events;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use client::{HttpClientFactory, HttpRegistryClient};
pub use events::RegistryEvent;
pub use types::{Application, ApplicationQuery, Task};

/// Errors talking to the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Registry answered with a non-success status.
    #[error("registry returned status {status} for {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Endpoint is not a usable URL.
    #[error("invalid registry endpoint: {0}")]
    InvalidEndpoint(String),

    /// TLS material could not be loaded.
    #[error("TLS setup failed: {0}")]
    Tls(String),

    /// Every configured endpoint failed; carries the last error.
    #[error("all registry endpoints failed: {0}")]
    AllEndpointsFailed(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Operations the provider consumes from the registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Fetch a snapshot of all applications.
    async fn applications(&self, query: &ApplicationQuery) -> RegistryResult<Vec<Application>>;

    /// Readiness probe.
    async fn ping(&self) -> RegistryResult<()>;

    /// Subscribe to application change events.
    async fn subscribe(&self) -> RegistryResult<mpsc::Receiver<RegistryEvent>>;
}

/// Builds registry clients; invoked on every connection attempt.
pub trait ClientFactory: Send + Sync {
    fn connect(&self) -> RegistryResult<Arc<dyn RegistryClient>>;
}

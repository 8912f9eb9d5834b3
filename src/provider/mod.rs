//! Marathon provider: turns registry snapshots into routing configurations.
//!
//! # Data Flow
//! ```text
//! connector.rs (connect, subscribe, wait for events)
//!     → registry snapshot (Vec<Application>)
//!     → filter.rs (enable flag, constraints, task readiness)
//!         → labels.rs / endpoint.rs / constraints.rs
//!     → synthesis.rs (backends, frontends, servers)
//!     → ConfigMessage on the outbound channel
//! ```
//!
//! # Design Decisions
//! - Filtering builds a new snapshot; the fetched one is never mutated
//! - Synthesis is a pure function of snapshot and discovery config
//! - Label lookups go through one typed accessor with per-key defaults

pub mod connector;
pub mod constraints;
pub mod endpoint;
pub mod filter;
pub mod labels;
pub mod synthesis;

use thiserror::Error;

use crate::registry::RegistryError;

pub use connector::{Provider, PROVIDER_NAME};
pub use constraints::{Constraint, ConstraintError};
pub use endpoint::EndpointError;
pub use filter::InstanceFilter;
pub use labels::Labels;
pub use synthesis::ConfigSynthesizer;

/// Errors that end a provider session and trigger a reconnect.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("event subscription closed")]
    SubscriptionClosed,
}

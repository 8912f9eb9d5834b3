//! Routing configuration handed to the proxy's routing core.
//!
//! # Data Flow
//! ```text
//! Provider reconciliation
//!     → RoutingConfiguration (backends + frontends, freshly built)
//!     → ConfigMessage { provider_name, configuration }
//!     → mpsc channel → routing core (sole consumer)
//! ```
//!
//! # Design Decisions
//! - Plain value types; once published they are never mutated
//! - BTreeMaps keep iteration and serialization order deterministic
//! - Rendering to text (TOML, JSON) is the consumer's business

pub mod types;

pub use types::{
    Backend, CircuitBreaker, ConfigMessage, Frontend, HealthCheck, LoadBalancer, MaxConn, Route,
    RoutingConfiguration, Server,
};

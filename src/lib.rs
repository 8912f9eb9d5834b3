//! Marathon service-discovery provider library.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod provider;
pub mod registry;
pub mod resilience;
pub mod routing;

pub use config::schema::ProviderConfig;
pub use lifecycle::{Shutdown, WorkerPool};
pub use provider::Provider;
pub use routing::{ConfigMessage, RoutingConfiguration};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProviderConfig (validated, immutable)
//!     → cloned into the provider at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Constraint expressions are parsed during deserialization

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ProviderConfig;
pub use schema::RegistryConfig;
pub use schema::DiscoveryConfig;
pub use schema::BackoffConfig;
pub use schema::ObservabilityConfig;
pub use schema::{BasicAuthConfig, ClientTlsConfig};
pub use loader::{load_config, parse_config, ConfigError};

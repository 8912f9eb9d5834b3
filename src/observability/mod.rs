//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Provider and registry client produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (reconciliation counters, backend/server gauges)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields (app, task, error) instead of interpolated messages
//! - Metrics go through the `metrics` facade; without an exporter they are no-ops

pub mod logging;
pub mod metrics;

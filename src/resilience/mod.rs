//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Registry connection attempt fails:
//!     → backoff.rs (next exponential delay with jitter)
//!     → connector sleeps (interruptible by shutdown) and retries
//! Successful connection:
//!     → backoff reset
//! ```
//!
//! # Design Decisions
//! - Retries are unbounded; the provider never gives up on the registry
//! - Jittered backoff prevents thundering herd across provider replicas

pub mod backoff;

pub use backoff::{calculate_backoff, Backoff};

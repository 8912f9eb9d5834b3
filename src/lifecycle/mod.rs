//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Start worker pool → Provider worker
//!
//! Shutdown (shutdown.rs + pool.rs):
//!     Ctrl+C → WorkerPool::stop() → broadcast to every worker → join all
//! ```
//!
//! # Design Decisions
//! - Every background worker receives its own shutdown receiver at spawn time
//! - A single trigger reaches all workers; nothing is left running detached

pub mod pool;
pub mod shutdown;

pub use pool::WorkerPool;
pub use shutdown::Shutdown;

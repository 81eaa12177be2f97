//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health (http/server.rs)
//!     → aggregator.rs: probe every registered resource concurrently
//!     → per-probe timeout, panics contained
//!     → CompositeHealth (UP iff every probe is healthy)
//!     → http/response.rs serializes and picks the status code
//! ```
//!
//! # Design Decisions
//! - No background polling: every snapshot is computed on demand
//! - Zero registered resources is UP
//! - Snapshots are advisory once shutdown has begun

pub mod aggregator;

pub use aggregator::{CompositeHealth, HealthAggregator, HealthStatus};

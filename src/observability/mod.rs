//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! health + lifecycle subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (gauges, counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

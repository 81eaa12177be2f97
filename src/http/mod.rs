//! HTTP layer.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → server.rs (health_handler)
//!     → HealthAggregator::check_all
//!     → response.rs (wire format + status code)
//!
//! /admin/* (when enabled)
//!     → admin::handlers (lifecycle state, shutdown trigger)
//! ```
//!
//! # Design Decisions
//! - Handlers never fail on resource faults; only aggregation task failure is a 500
//! - The serve loop is itself a managed resource (resources::listener)

pub mod response;
pub mod server;

pub use server::{build_router, AppState, HttpServer};

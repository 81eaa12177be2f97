//! Service Lifecycle Controller Library

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resources;

pub use config::ServiceConfig;
pub use health::{CompositeHealth, HealthAggregator};
pub use lifecycle::{ManagedResource, ResourceRegistry, ShutdownOrchestrator, ShutdownReport};

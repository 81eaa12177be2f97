//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → CLI overrides applied in main.rs, then re-validated
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the resource set never changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, DependencyConfig, DependencyKind, HealthConfig, LogFormat, ObservabilityConfig,
    ServerConfig, ServiceConfig, ShutdownConfig,
};

//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ratios within bounds)
//! - Detect dependency name collisions before registration
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{DependencyKind, ServiceConfig};

/// Names taken by built-in resources.
pub const RESERVED_NAMES: [&str; 3] = ["listener", "memory", "disk"];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: '{value}' is not a valid socket address")]
    InvalidSocketAddr { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be within (0, 1]")]
    RatioOutOfRange { field: &'static str },

    #[error("dependency name must not be empty")]
    EmptyDependencyName,

    #[error("dependency name '{0}' has surrounding whitespace")]
    PaddedDependencyName(String),

    #[error("dependency '{0}' is defined more than once")]
    DuplicateDependency(String),

    #[error("dependency name '{0}' is reserved")]
    ReservedName(String),

    #[error("dependency '{name}': address '{address}' must be host:port")]
    InvalidDependencyAddress { name: String, address: String },

    #[error("dependency '{0}': http path must start with '/'")]
    InvalidProbePath(String),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "server.request_timeout_secs",
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidSocketAddr {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.shutdown.deadline_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "shutdown.deadline_ms",
        });
    }
    if config.health.probe_timeout_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "health.probe_timeout_ms",
        });
    }
    if config.health.memory_ceiling_mb == 0 {
        errors.push(ValidationError::Zero {
            field: "health.memory_ceiling_mb",
        });
    }
    if !in_unit_range(config.health.memory_threshold) {
        errors.push(ValidationError::RatioOutOfRange {
            field: "health.memory_threshold",
        });
    }
    if config.health.disk_enabled && !in_unit_range(config.health.disk_min_free_ratio) {
        errors.push(ValidationError::RatioOutOfRange {
            field: "health.disk_min_free_ratio",
        });
    }

    let mut seen = HashSet::new();
    for dep in &config.dependencies {
        let name = dep.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyDependencyName);
            continue;
        }
        if name != dep.name {
            errors.push(ValidationError::PaddedDependencyName(dep.name.clone()));
        }
        if RESERVED_NAMES.contains(&name) {
            errors.push(ValidationError::ReservedName(name.to_string()));
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateDependency(name.to_string()));
        }
        if !is_host_port(&dep.address) {
            errors.push(ValidationError::InvalidDependencyAddress {
                name: name.to_string(),
                address: dep.address.clone(),
            });
        }
        if dep.kind == DependencyKind::Http && !dep.path.starts_with('/') {
            errors.push(ValidationError::InvalidProbePath(name.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn in_unit_range(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

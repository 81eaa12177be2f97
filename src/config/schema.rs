//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings.
    pub server: ServerConfig,

    /// Health aggregation settings.
    pub health: HealthConfig,

    /// Shutdown orchestration settings.
    pub shutdown: ShutdownConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// External dependencies registered as managed resources.
    pub dependencies: Vec<DependencyConfig>,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Upper bound for a single probe, in milliseconds.
    pub probe_timeout_ms: u64,

    /// Memory ceiling in megabytes.
    pub memory_ceiling_mb: u64,

    /// Fraction of the ceiling at which memory is reported unhealthy.
    pub memory_threshold: f64,

    /// Enable the free disk space check.
    pub disk_enabled: bool,

    /// Filesystem path whose free space is checked.
    pub disk_path: String,

    /// Minimum free fraction before disk is reported unhealthy.
    pub disk_min_free_ratio: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 3000,
            memory_ceiling_mb: 1024,
            memory_threshold: 0.9,
            disk_enabled: true,
            disk_path: "/".to_string(),
            disk_min_free_ratio: 0.1,
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Global deadline for releasing every resource, in milliseconds.
    pub deadline_ms: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { deadline_ms: 10_000 }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin/status` and `/admin/shutdown`.
    pub enabled: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// How a dependency is probed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// Plain TCP connection (database, cache).
    Tcp,
    /// HTTP GET against a health path.
    Http,
}

/// External dependency definition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyConfig {
    /// Unique resource name.
    pub name: String,

    /// Probe style.
    pub kind: DependencyKind,

    /// Address (e.g., "127.0.0.1:5432").
    pub address: String,

    /// Path probed for HTTP dependencies.
    #[serde(default = "default_probe_path")]
    pub path: String,
}

fn default_probe_path() -> String {
    "/health".to_string()
}

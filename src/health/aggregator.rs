//! Composite health aggregation.
//!
//! # Responsibilities
//! - Probe every registered resource concurrently
//! - Bound each probe with its own timeout
//! - Reduce the individual outcomes into one snapshot

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures_util::future::join_all;

use crate::lifecycle::resource::probe_guarded;
use crate::lifecycle::{ManagedResource, ProbeOutcome, ResourceRegistry};

/// Overall status of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Up => "UP",
            HealthStatus::Down => "DOWN",
        }
    }
}

/// Immutable health snapshot over all managed resources.
#[derive(Debug, Clone)]
pub struct CompositeHealth {
    pub status: HealthStatus,
    pub checks: BTreeMap<String, ProbeOutcome>,
    pub uptime: Duration,
    pub timestamp: DateTime<Utc>,
}

impl CompositeHealth {
    /// Build a snapshot; status is the logical AND of every check.
    pub fn from_checks(
        checks: BTreeMap<String, ProbeOutcome>,
        uptime: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let status = if checks.values().all(ProbeOutcome::is_healthy) {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };
        Self {
            status,
            checks,
            uptime,
            timestamp,
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Runs on-demand health checks against the resource registry.
///
/// There is no internal scheduling; callers poll `check_all` as needed.
#[derive(Clone)]
pub struct HealthAggregator {
    registry: Arc<ResourceRegistry>,
    probe_timeout: Duration,
    started_at: Instant,
}

impl HealthAggregator {
    pub fn new(registry: Arc<ResourceRegistry>, probe_timeout: Duration) -> Self {
        Self {
            registry,
            probe_timeout,
            started_at: Instant::now(),
        }
    }

    /// Probe every resource and combine the results.
    pub async fn check_all(&self) -> CompositeHealth {
        let probes = self
            .registry
            .iter()
            .map(|resource| self.probe_one(Arc::clone(resource)));
        let checks: BTreeMap<String, ProbeOutcome> = join_all(probes).await.into_iter().collect();

        let snapshot = CompositeHealth::from_checks(checks, self.started_at.elapsed(), Utc::now());
        tracing::debug!(
            status = snapshot.status.as_str(),
            resources = snapshot.checks.len(),
            "Health snapshot taken"
        );
        snapshot
    }

    async fn probe_one(&self, resource: Arc<dyn ManagedResource>) -> (String, ProbeOutcome) {
        let name = resource.name().to_string();
        let started = Instant::now();

        let outcome = match tokio::time::timeout(self.probe_timeout, probe_guarded(resource.as_ref())).await {
            Ok(outcome) => outcome,
            Err(_) => ProbeOutcome::unhealthy(format!(
                "probe timed out after {}ms",
                self.probe_timeout.as_millis()
            )),
        };

        if let ProbeOutcome::Unhealthy { detail } = &outcome {
            tracing::warn!(resource = %name, detail = %detail, "Health check failed");
        }
        metrics::gauge!("lifecycle_resource_healthy", "resource" => name.clone())
            .set(if outcome.is_healthy() { 1.0 } else { 0.0 });
        metrics::histogram!("lifecycle_probe_duration_seconds", "resource" => name.clone())
            .record(started.elapsed().as_secs_f64());

        (name, outcome)
    }
}

//! The managed resource contract.
//!
//! # Responsibilities
//! - Define the probe/release interface every long-lived collaborator exposes
//! - Define the tagged outcomes both operations produce
//! - Contain faults: a panicking probe or release becomes an outcome value
//!
//! # Design Decisions
//! - Resources are owned by the application and shared as `Arc<dyn ManagedResource>`
//! - Outcome details are opaque to the lifecycle core
//! - Probe and release stay callable after earlier failures

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures_util::FutureExt;
use serde_json::Value;

/// A named dependency with a liveness probe and a best-effort close.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Unique name used as the key in health snapshots and shutdown reports.
    fn name(&self) -> &str;

    /// Cheap, side-effect-free liveness check.
    async fn probe(&self) -> ProbeOutcome;

    /// Close or disconnect. Intended to be idempotent, but may fail.
    async fn release(&self) -> ReleaseOutcome;
}

/// Result of a single probe.
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// The resource is live. Optional diagnostics are passed through untouched.
    Healthy { details: Option<Value> },
    /// The resource is not live.
    Unhealthy { detail: Value },
}

impl ProbeOutcome {
    pub fn healthy() -> Self {
        ProbeOutcome::Healthy { details: None }
    }

    pub fn healthy_with(details: impl Into<Value>) -> Self {
        ProbeOutcome::Healthy {
            details: Some(details.into()),
        }
    }

    pub fn unhealthy(detail: impl Into<Value>) -> Self {
        ProbeOutcome::Unhealthy {
            detail: detail.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy { .. })
    }

    /// Diagnostics attached to either variant.
    pub fn details(&self) -> Option<&Value> {
        match self {
            ProbeOutcome::Healthy { details } => details.as_ref(),
            ProbeOutcome::Unhealthy { detail } => Some(detail),
        }
    }
}

/// Result of a single release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Closed,
    Failed { detail: String },
}

impl ReleaseOutcome {
    pub fn failed(detail: impl Into<String>) -> Self {
        ReleaseOutcome::Failed {
            detail: detail.into(),
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ReleaseOutcome::Closed)
    }
}

/// Run a probe, turning a panic into `Unhealthy`.
pub async fn probe_guarded(resource: &dyn ManagedResource) -> ProbeOutcome {
    match AssertUnwindSafe(resource.probe()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(resource = resource.name(), panic = %message, "Probe panicked");
            ProbeOutcome::unhealthy(format!("probe panicked: {}", message))
        }
    }
}

/// Run a release, turning a panic into `Failed`.
pub async fn release_guarded(resource: &dyn ManagedResource) -> ReleaseOutcome {
    match AssertUnwindSafe(resource.release()).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(resource = resource.name(), panic = %message, "Release panicked");
            ReleaseOutcome::failed(format!("release panicked: {}", message))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

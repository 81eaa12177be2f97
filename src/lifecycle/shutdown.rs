//! Deadline-bounded shutdown of every registered resource.
//!
//! # State Machine
//! ```text
//! Idle ──shutdown()──▶ Draining ──all releases returned──▶ Completed(Clean | Partial)
//!                          │
//!                          └──────deadline elapsed───────▶ Completed(TimedOut)
//! ```
//!
//! # Design Decisions
//! - Only the caller that wins Idle → Draining spawns the drain task
//! - Later callers, concurrent or not, await the same report
//! - Releases run in parallel with no ordering between resources
//! - Releases still running at the deadline are abandoned, not cancelled

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;

use super::resource::release_guarded;
use super::{ReleaseOutcome, ResourceRegistry};

/// Detail recorded for resources that had not reported when the deadline fired.
pub const DEADLINE_DETAIL: &str = "release did not complete before deadline";

/// Overall classification of a shutdown attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownResult {
    /// Every release returned `Closed` before the deadline.
    Clean,
    /// Every release returned before the deadline, at least one `Failed`.
    Partial,
    /// The deadline elapsed first.
    TimedOut,
}

impl ShutdownResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownResult::Clean => "clean",
            ShutdownResult::Partial => "partial",
            ShutdownResult::TimedOut => "timed_out",
        }
    }
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Draining,
    Completed(ShutdownResult),
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Draining => "draining",
            LifecycleState::Completed(_) => "completed",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, LifecycleState::Idle)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Completed(result) => write!(f, "completed:{}", result.as_str()),
            other => f.write_str(other.as_str()),
        }
    }
}

/// What asked the process to stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownCause {
    /// An OS termination signal, by name.
    Signal(&'static str),
    /// An explicit call through the admin API.
    Api,
    /// A fault outside the orchestrator, e.g. the server task failing.
    Fault(String),
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal(name) => write!(f, "signal {}", name),
            ShutdownCause::Api => f.write_str("api request"),
            ShutdownCause::Fault(detail) => write!(f, "fault: {}", detail),
        }
    }
}

/// Terminal record of one shutdown attempt.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    pub result: ShutdownResult,
    pub cause: ShutdownCause,
    pub outcomes: BTreeMap<String, ReleaseOutcome>,
    pub elapsed: Duration,
}

impl ShutdownReport {
    /// Conventional process exit code: 0 only for a clean, non-fault shutdown.
    pub fn exit_code(&self) -> i32 {
        match (&self.cause, self.result) {
            (ShutdownCause::Fault(_), _) => 1,
            (_, ShutdownResult::Clean) => 0,
            (_, ShutdownResult::Partial | ShutdownResult::TimedOut) => 1,
        }
    }
}

struct Inner {
    registry: Arc<ResourceRegistry>,
    state_tx: watch::Sender<LifecycleState>,
    report_tx: watch::Sender<Option<Arc<ShutdownReport>>>,
}

/// Runs every resource's release concurrently against a single deadline.
#[derive(Clone)]
pub struct ShutdownOrchestrator {
    inner: Arc<Inner>,
}

impl ShutdownOrchestrator {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        let (state_tx, _) = watch::channel(LifecycleState::Idle);
        let (report_tx, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                registry,
                state_tx,
                report_tx,
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.inner.state_tx.borrow()
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.inner.state_tx.subscribe()
    }

    /// Start (or join) the shutdown and wait for its report.
    ///
    /// Only the first call starts releasing; `deadline` and `cause` of later
    /// calls are ignored and the in-flight or cached report is returned.
    pub async fn shutdown(&self, deadline: Duration, cause: ShutdownCause) -> Arc<ShutdownReport> {
        let report_rx = self.inner.report_tx.subscribe();
        self.trigger(deadline, cause);
        wait_for_report(report_rx).await
    }

    /// Start the shutdown without waiting for it.
    ///
    /// Returns `true` only for the call that moved the orchestrator out of `Idle`.
    pub fn trigger(&self, deadline: Duration, cause: ShutdownCause) -> bool {
        let started = self.inner.state_tx.send_if_modified(|state| {
            if state.is_idle() {
                *state = LifecycleState::Draining;
                true
            } else {
                false
            }
        });

        if !started {
            tracing::info!(
                cause = %cause,
                state = %self.state(),
                "Shutdown already in progress, joining it"
            );
            return false;
        }

        tracing::info!(
            cause = %cause,
            deadline_ms = deadline.as_millis() as u64,
            resources = self.inner.registry.len(),
            "Starting graceful shutdown"
        );
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let report = drain(&inner.registry, deadline, cause).await;
            record_report(&report);
            let result = report.result;
            inner.report_tx.send_replace(Some(Arc::new(report)));
            inner
                .state_tx
                .send_replace(LifecycleState::Completed(result));
        });
        true
    }

    /// Wait for the report of a shutdown started by someone else.
    pub async fn completed(&self) -> Arc<ShutdownReport> {
        wait_for_report(self.inner.report_tx.subscribe()).await
    }
}

async fn wait_for_report(
    mut report_rx: watch::Receiver<Option<Arc<ShutdownReport>>>,
) -> Arc<ShutdownReport> {
    loop {
        if let Some(report) = report_rx.borrow_and_update().as_ref() {
            return Arc::clone(report);
        }
        // The sender lives in `Inner`, which `self` keeps alive for the whole wait.
        if report_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Fan out releases, then race their joint completion against the deadline.
async fn drain(
    registry: &ResourceRegistry,
    deadline: Duration,
    cause: ShutdownCause,
) -> ShutdownReport {
    let started = Instant::now();
    let expected = registry.len();
    let (tx, mut rx) = mpsc::unbounded_channel::<(String, ReleaseOutcome)>();

    for resource in registry.iter() {
        let resource = Arc::clone(resource);
        let tx = tx.clone();
        tokio::spawn(async move {
            let release_started = Instant::now();
            let outcome = release_guarded(resource.as_ref()).await;
            match &outcome {
                ReleaseOutcome::Closed => tracing::info!(
                    resource = resource.name(),
                    elapsed_ms = release_started.elapsed().as_millis() as u64,
                    "Resource released"
                ),
                ReleaseOutcome::Failed { detail } => tracing::error!(
                    resource = resource.name(),
                    detail = %detail,
                    "Resource release failed"
                ),
            }
            // The receiver is gone once the deadline fired; late outcomes are dropped.
            let _ = tx.send((resource.name().to_string(), outcome));
        });
    }
    drop(tx);

    let mut outcomes = BTreeMap::new();
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    let timed_out = loop {
        if outcomes.len() == expected {
            break false;
        }
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some((name, outcome)) => {
                    outcomes.insert(name, outcome);
                }
                None => break false,
            },
            _ = &mut timer => break true,
        }
    };

    let result = if timed_out {
        for name in registry.names() {
            if !outcomes.contains_key(name) {
                tracing::warn!(resource = name, "Release abandoned at deadline");
                outcomes.insert(name.to_string(), ReleaseOutcome::failed(DEADLINE_DETAIL));
            }
        }
        ShutdownResult::TimedOut
    } else if outcomes.values().all(ReleaseOutcome::is_closed) {
        ShutdownResult::Clean
    } else {
        ShutdownResult::Partial
    };

    ShutdownReport {
        result,
        cause,
        outcomes,
        elapsed: started.elapsed(),
    }
}

fn record_report(report: &ShutdownReport) {
    metrics::counter!("lifecycle_shutdowns_total", "result" => report.result.as_str()).increment(1);
    metrics::histogram!("lifecycle_shutdown_duration_seconds").record(report.elapsed.as_secs_f64());
    for (name, outcome) in &report.outcomes {
        if !outcome.is_closed() {
            metrics::counter!("lifecycle_release_failures_total", "resource" => name.clone())
                .increment(1);
        }
    }

    match report.result {
        ShutdownResult::Clean => tracing::info!(
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Graceful shutdown completed"
        ),
        result => tracing::error!(
            result = result.as_str(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            failed = report.outcomes.values().filter(|o| !o.is_closed()).count(),
            "Graceful shutdown did not complete cleanly"
        ),
    }
}

//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT, SIGHUP)
//! - Translate every delivery into a shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated signals are forwarded; the orchestrator coalesces them
//! - The adapter never waits on the report, so it keeps observing signals

use std::time::Duration;

use tokio::task::JoinHandle;

use super::{ShutdownCause, ShutdownOrchestrator};

/// Install the handlers, then spawn a task that calls `shutdown(deadline)` on every
/// termination signal. Handlers are in place once this returns.
pub fn spawn_signal_listener(
    orchestrator: ShutdownOrchestrator,
    deadline: Duration,
) -> std::io::Result<JoinHandle<()>> {
    let mut signals = TerminationSignals::install()?;

    Ok(tokio::spawn(async move {
        loop {
            let Some(name) = signals.recv().await else {
                tracing::warn!("Signal stream closed");
                return;
            };

            if orchestrator.state().is_idle() {
                tracing::warn!(signal = name, "Received signal, starting shutdown");
            } else {
                tracing::warn!(
                    signal = name,
                    state = %orchestrator.state(),
                    "Received signal while shutting down, coalescing"
                );
            }

            orchestrator.trigger(deadline, ShutdownCause::Signal(name));
        }
    }))
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            hangup: signal(SignalKind::hangup())?,
        })
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::select! {
            s = self.interrupt.recv() => s.map(|_| "SIGINT"),
            s = self.terminate.recv() => s.map(|_| "SIGTERM"),
            s = self.hangup.recv() => s.map(|_| "SIGHUP"),
        }
    }
}

#[cfg(not(unix))]
struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    fn install() -> std::io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> Option<&'static str> {
        tokio::signal::ctrl_c().await.ok().map(|_| "CTRL_C")
    }
}

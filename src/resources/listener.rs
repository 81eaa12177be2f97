//! The HTTP listener as a managed resource.
//!
//! Release broadcasts a stop to the serve loop (axum graceful shutdown) and
//! waits for the serve task to finish draining in-flight requests.

use std::net::SocketAddr;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

pub const LISTENER_RESOURCE: &str = "listener";

/// Handle to a running serve task.
pub struct ListenerResource {
    local_addr: SocketAddr,
    stop_tx: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl ListenerResource {
    pub fn new(local_addr: SocketAddr) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            local_addr,
            stop_tx,
            task: Mutex::new(None),
        }
    }

    /// Future that resolves when release is requested. Pass to the serve loop.
    pub fn stop_signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut stop_rx = self.stop_tx.subscribe();
        async move {
            let _ = stop_rx.recv().await;
            tracing::info!("Listener stop requested, draining connections");
        }
    }

    /// Hand over the serve task once it has been spawned.
    pub fn attach(&self, task: JoinHandle<std::io::Result<()>>) {
        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(task);
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl ManagedResource for ListenerResource {
    fn name(&self) -> &str {
        LISTENER_RESOURCE
    }

    async fn probe(&self) -> ProbeOutcome {
        let serving = match self.task.lock() {
            Ok(slot) => slot.as_ref().map(|task| !task.is_finished()),
            Err(_) => None,
        };
        match serving {
            Some(true) => ProbeOutcome::healthy_with(serde_json::json!({
                "address": self.local_addr.to_string(),
            })),
            Some(false) => ProbeOutcome::unhealthy("serve task has exited"),
            None => ProbeOutcome::unhealthy("listener is not serving"),
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        let _ = self.stop_tx.send(());

        let task = match self.task.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => return ReleaseOutcome::failed("listener state poisoned"),
        };
        // A previous release already took and awaited the task.
        let Some(task) = task else {
            return ReleaseOutcome::Closed;
        };

        match task.await {
            Ok(Ok(())) => ReleaseOutcome::Closed,
            Ok(Err(e)) => ReleaseOutcome::failed(format!("server error: {}", e)),
            Err(e) => ReleaseOutcome::failed(format!("serve task failed: {}", e)),
        }
    }
}

//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;

use service_lifecycle::config::ServiceConfig;
use service_lifecycle::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

/// Start a TCP server that accepts and holds connections, standing in for a database.
pub async fn start_tcp_dependency() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_address() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config bound to an ephemeral port with admin routes on and the disk check off.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.admin.enabled = true;
    config.health.disk_enabled = false;
    config.health.memory_ceiling_mb = 1024 * 1024;
    config.health.probe_timeout_ms = 1000;
    config.shutdown.deadline_ms = 2000;
    config
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Resource with scripted probe/release results and call counters.
pub struct ScriptedResource {
    name: String,
    healthy: bool,
    release_ok: bool,
    release_delay: Duration,
    pub probes: AtomicUsize,
    pub releases: AtomicUsize,
}

impl ScriptedResource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            healthy: true,
            release_ok: true,
            release_delay: Duration::ZERO,
            probes: AtomicUsize::new(0),
            releases: AtomicUsize::new(0),
        }
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn failing_release(mut self) -> Self {
        self.release_ok = false;
        self
    }

    pub fn release_delay(mut self, delay: Duration) -> Self {
        self.release_delay = delay;
        self
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ManagedResource for ScriptedResource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> ProbeOutcome {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.healthy {
            ProbeOutcome::healthy()
        } else {
            ProbeOutcome::unhealthy(format!("{} unreachable", self.name))
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        self.releases.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.release_delay).await;
        if self.release_ok {
            ReleaseOutcome::Closed
        } else {
            ReleaseOutcome::failed(format!("{} refused to close", self.name))
        }
    }
}

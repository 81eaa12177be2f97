//! TCP dependency (database, cache) as a managed resource.
//!
//! Holds one long-lived connection opened at startup. Probes use a fresh
//! connection so they never interfere with the held one.

use std::future::Future;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::lifecycle::{ManagedResource, ProbeOutcome, ReleaseOutcome};

pub struct TcpDependency {
    name: String,
    address: String,
    connect_timeout: Duration,
    connection: Mutex<Option<TcpStream>>,
}

impl TcpDependency {
    pub fn new(name: impl Into<String>, address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            connect_timeout,
            connection: Mutex::new(None),
        }
    }

    /// Open the held connection. Failure is logged, not fatal; probes will report it.
    pub async fn connect(&self) -> bool {
        match self.open().await {
            Ok(stream) => {
                tracing::info!(name = %self.name, address = %self.address, "Dependency connected");
                *self.connection.lock().await = Some(stream);
                true
            }
            Err(e) => {
                tracing::warn!(
                    name = %self.name,
                    address = %self.address,
                    error = %e,
                    "Dependency unreachable at startup"
                );
                false
            }
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    async fn open(&self) -> io::Result<TcpStream> {
        within(self.connect_timeout, TcpStream::connect(&self.address)).await
    }
}

/// A blackholed host otherwise holds a connect until the kernel gives up on SYNs.
async fn within<T>(limit: Duration, attempt: impl Future<Output = io::Result<T>>) -> io::Result<T> {
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("no answer within {}ms", limit.as_millis()),
        )),
    }
}

#[async_trait]
impl ManagedResource for TcpDependency {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.open().await {
            Ok(_) => ProbeOutcome::healthy(),
            Err(e) => ProbeOutcome::unhealthy(format!("{}: {}", self.address, e)),
        }
    }

    async fn release(&self) -> ReleaseOutcome {
        let Some(mut stream) = self.connection.lock().await.take() else {
            return ReleaseOutcome::Closed;
        };
        match stream.shutdown().await {
            Ok(()) => ReleaseOutcome::Closed,
            // The peer may already have dropped us; the socket is closed either way.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => ReleaseOutcome::Closed,
            Err(e) => ReleaseOutcome::failed(format!("disconnect from {} failed: {}", self.address, e)),
        }
    }
}

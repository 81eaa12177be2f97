//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener
//! - Register every managed resource before serving begins
//! - Wire the health aggregator and shutdown orchestrator into the HTTP server
//!
//! # Design Decisions
//! - Fail fast: bind and registration errors are fatal
//! - Dependencies that are down at startup are registered anyway; health reports them
//! - Listener is registered first and starts serving last
//! - A failing or panicking serve loop shuts the process down with a fault cause

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{DependencyKind, ServiceConfig};
use crate::health::HealthAggregator;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::resource::panic_message;
use crate::lifecycle::{RegistrationError, ResourceRegistry, ShutdownCause, ShutdownOrchestrator};
use crate::resources::{DiskResource, HttpDependency, ListenerResource, MemoryResource, TcpDependency};

/// Fatal errors that prevent the process from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// A running service: the server task is spawned and owned by the listener resource.
pub struct Service {
    pub local_addr: SocketAddr,
    pub aggregator: HealthAggregator,
    pub orchestrator: ShutdownOrchestrator,
    pub shutdown_deadline: Duration,
}

/// Bind, register, and start serving.
pub async fn launch(config: &ServiceConfig) -> Result<Service, StartupError> {
    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.server.bind_address.clone(),
            source,
        })?;
    let local_addr = listener.local_addr().map_err(|source| StartupError::Bind {
        address: config.server.bind_address.clone(),
        source,
    })?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let listener_resource = Arc::new(ListenerResource::new(local_addr));
    let registry = Arc::new(build_registry(config, Arc::clone(&listener_resource)).await?);

    let aggregator = HealthAggregator::new(
        Arc::clone(&registry),
        Duration::from_millis(config.health.probe_timeout_ms),
    );
    let orchestrator = ShutdownOrchestrator::new(registry);
    let shutdown_deadline = Duration::from_millis(config.shutdown.deadline_ms);

    let server = HttpServer::new(
        config,
        AppState {
            aggregator: aggregator.clone(),
            orchestrator: orchestrator.clone(),
            shutdown_deadline,
        },
    );
    let stop = listener_resource.stop_signal();
    let task = tokio::spawn(supervise(
        server.run(listener, stop),
        orchestrator.clone(),
        shutdown_deadline,
    ));
    listener_resource.attach(task);

    Ok(Service {
        local_addr,
        aggregator,
        orchestrator,
        shutdown_deadline,
    })
}

/// Drive the serve loop. An error or a panic in it starts a fault shutdown.
async fn supervise(
    serve: impl Future<Output = io::Result<()>>,
    orchestrator: ShutdownOrchestrator,
    deadline: Duration,
) -> io::Result<()> {
    let result = match AssertUnwindSafe(serve).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(io::Error::other(format!(
            "serve task panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "HTTP server failed");
        // Not awaited: the listener release waits on this very task.
        orchestrator.trigger(deadline, ShutdownCause::Fault(format!("http server: {}", e)));
    }
    result
}

/// Register the built-in resources followed by configured dependencies.
pub async fn build_registry(
    config: &ServiceConfig,
    listener: Arc<ListenerResource>,
) -> Result<ResourceRegistry, RegistrationError> {
    let mut registry = ResourceRegistry::new();

    registry.register(listener)?;
    registry.register(Arc::new(MemoryResource::new(
        config.health.memory_ceiling_mb,
        config.health.memory_threshold,
    )))?;
    if config.health.disk_enabled {
        registry.register(Arc::new(DiskResource::new(
            config.health.disk_path.clone(),
            config.health.disk_min_free_ratio,
        )))?;
    }

    for dep in &config.dependencies {
        match dep.kind {
            DependencyKind::Tcp => {
                let resource = TcpDependency::new(
                    dep.name.clone(),
                    dep.address.clone(),
                    Duration::from_millis(config.health.probe_timeout_ms),
                );
                resource.connect().await;
                registry.register(Arc::new(resource))?;
            }
            DependencyKind::Http => {
                registry.register(Arc::new(HttpDependency::new(
                    dep.name.clone(),
                    &dep.address,
                    &dep.path,
                )))?;
            }
        }
    }

    tracing::info!(resources = ?registry.names(), "Resource registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DependencyConfig;
    use crate::lifecycle::resource::mock::MockResource;
    use crate::lifecycle::ShutdownResult;

    fn orchestrator() -> ShutdownOrchestrator {
        let mut registry = ResourceRegistry::new();
        registry.register(Arc::new(MockResource::new("db"))).unwrap();
        ShutdownOrchestrator::new(Arc::new(registry))
    }

    async fn failing_server() -> io::Result<()> {
        Err(io::Error::other("too many open files"))
    }

    async fn exploding_server() -> io::Result<()> {
        panic!("accept loop exploded")
    }

    async fn stopped_server() -> io::Result<()> {
        Ok(())
    }

    fn listener() -> Arc<ListenerResource> {
        Arc::new(ListenerResource::new("127.0.0.1:0".parse().unwrap()))
    }

    #[tokio::test]
    async fn registers_builtins_then_dependencies() {
        let mut config = ServiceConfig::default();
        config.dependencies.push(DependencyConfig {
            name: "search".into(),
            kind: DependencyKind::Http,
            address: "127.0.0.1:9200".into(),
            path: "/health".into(),
        });

        let registry = build_registry(&config, listener()).await.unwrap();
        assert_eq!(registry.names(), vec!["listener", "memory", "disk", "search"]);
    }

    #[tokio::test]
    async fn duplicate_dependency_is_a_registration_conflict() {
        let mut config = ServiceConfig::default();
        config.health.disk_enabled = false;
        for _ in 0..2 {
            config.dependencies.push(DependencyConfig {
                name: "search".into(),
                kind: DependencyKind::Http,
                address: "127.0.0.1:9200".into(),
                path: "/health".into(),
            });
        }

        let err = build_registry(&config, listener()).await.err().unwrap();
        assert_eq!(
            err,
            RegistrationError::Conflict {
                name: "search".into()
            }
        );
    }

    #[tokio::test]
    async fn bind_failure_is_fatal() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = ServiceConfig::default();
        config.server.bind_address = occupied.local_addr().unwrap().to_string();

        let err = launch(&config).await.err().unwrap();
        assert!(matches!(err, StartupError::Bind { .. }));
    }

    #[tokio::test]
    async fn server_error_starts_fault_shutdown() {
        let orchestrator = orchestrator();

        let result = supervise(failing_server(), orchestrator.clone(), Duration::from_secs(1)).await;
        assert!(result.is_err());

        let report = orchestrator.completed().await;
        assert!(matches!(
            report.cause,
            ShutdownCause::Fault(ref detail) if detail.contains("too many open files")
        ));
        assert_eq!(report.result, ShutdownResult::Clean);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn server_panic_starts_fault_shutdown() {
        let orchestrator = orchestrator();

        let err = supervise(exploding_server(), orchestrator.clone(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("accept loop exploded"));

        let report = orchestrator.completed().await;
        assert!(matches!(report.cause, ShutdownCause::Fault(_)));
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn clean_server_exit_leaves_orchestrator_idle() {
        let orchestrator = orchestrator();

        supervise(stopped_server(), orchestrator.clone(), Duration::from_secs(1))
            .await
            .unwrap();
        assert!(orchestrator.state().is_idle());
    }
}

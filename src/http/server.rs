//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the health endpoint and admin routes
//! - Wire up middleware (panic recovery, request timeout, tracing)
//! - Serve until the listener resource asks it to stop

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::ServiceConfig;
use crate::health::HealthAggregator;
use crate::http::response::{health_response, ApiError};
use crate::lifecycle::resource::panic_message;
use crate::lifecycle::ShutdownOrchestrator;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: HealthAggregator,
    pub orchestrator: ShutdownOrchestrator,
    pub shutdown_deadline: Duration,
}

/// HTTP server exposing health and admin endpoints.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServiceConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Serve on `listener` until `stop` resolves, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        stop: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(stop)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(config: &ServiceConfig, state: AppState) -> Router {
    let mut router: Router<AppState> = Router::new().route("/health", get(health_handler));
    if config.admin.enabled {
        router = router.merge(setup_admin_router());
    }

    with_middleware(router.fallback(not_found).with_state(state), config)
}

#[allow(deprecated)]
fn with_middleware(router: Router, config: &ServiceConfig) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
}

/// Compute a fresh snapshot, served with the current lifecycle state.
async fn health_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.aggregator.check_all().await;
    health_response(&snapshot, state.orchestrator.state())
}

async fn not_found() -> ApiError {
    ApiError::NotFound
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal(panic_message(payload.as_ref())).into_response()
}

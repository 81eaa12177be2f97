use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::http::AppState;
use crate::lifecycle::ShutdownCause;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub state: String,
}

#[derive(Serialize)]
pub struct ShutdownAccepted {
    pub accepted: bool,
    pub state: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        state: state.orchestrator.state().to_string(),
    })
}

/// Start a shutdown in the background. Only the request that started it is `accepted`.
pub async fn trigger_shutdown(
    State(state): State<AppState>,
) -> (StatusCode, Json<ShutdownAccepted>) {
    let accepted = state
        .orchestrator
        .trigger(state.shutdown_deadline, ShutdownCause::Api);
    let current = state.orchestrator.state().to_string();
    tracing::warn!(accepted, state = %current, "Shutdown requested via admin API");

    (
        StatusCode::ACCEPTED,
        Json(ShutdownAccepted {
            accepted,
            state: current,
        }),
    )
}

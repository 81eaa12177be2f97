//! Response shaping for the health endpoint and API errors.
//!
//! # Responsibilities
//! - Serialize `CompositeHealth` into the wire format
//! - Map snapshot status and lifecycle state to a status code
//! - Keep error bodies minimal
//!
//! # Design Decisions
//! - 200 for UP, 503 for DOWN, 500 only when a handler panicked
//! - Once shutdown has begun the snapshot is advisory and always served with 503

use std::collections::BTreeMap;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::health::CompositeHealth;
use crate::lifecycle::{LifecycleState, ProbeOutcome};

pub const LIFECYCLE_STATE_HEADER: &str = "x-lifecycle-state";

/// Wire form of a health snapshot.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub checks: BTreeMap<String, CheckBody>,
    /// Seconds since start.
    pub uptime: f64,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&ProbeOutcome> for CheckBody {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            status: if outcome.is_healthy() { "UP" } else { "DOWN" },
            details: outcome.details().cloned(),
        }
    }
}

impl From<&CompositeHealth> for HealthBody {
    fn from(snapshot: &CompositeHealth) -> Self {
        Self {
            status: snapshot.status.as_str(),
            checks: snapshot
                .checks
                .iter()
                .map(|(name, outcome)| (name.clone(), CheckBody::from(outcome)))
                .collect(),
            uptime: snapshot.uptime.as_secs_f64(),
            timestamp: snapshot.timestamp.timestamp_millis(),
        }
    }
}

/// Status code for a snapshot taken in the given lifecycle state.
pub fn health_status_code(snapshot: &CompositeHealth, state: LifecycleState) -> StatusCode {
    if snapshot.is_up() && state.is_idle() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub fn health_response(snapshot: &CompositeHealth, state: LifecycleState) -> Response {
    let mut response = (
        health_status_code(snapshot, state),
        Json(HealthBody::from(snapshot)),
    )
        .into_response();
    if !state.is_idle() {
        if let Ok(value) = HeaderValue::from_str(&state.to_string()) {
            response.headers_mut().insert(LIFECYCLE_STATE_HEADER, value);
        }
    }
    response
}

/// Errors surfaced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A handler panicked; the message is logged, never returned.
    #[error("handler panicked: {0}")]
    Internal(String),

    #[error("resource not found")]
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Internal(_) => {
                tracing::error!(error = %self, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"status": "error", "message": "Something went wrong"})),
                )
                    .into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({"message": "Resource not found"})),
            )
                .into_response(),
        }
    }
}

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::AppState;

/// Admin routes; merged into the main router when `admin.enabled` is set.
pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/shutdown", post(trigger_shutdown))
}

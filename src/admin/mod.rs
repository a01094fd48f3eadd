//! Admin API.
//!
//! Bearer-token protected, mounted under `/admin` when `admin.enabled`.
//! Admin requests pass through the rate limiter like any other request,
//! under the `admin` class.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/limits", get(get_limits))
        .route("/admin/usage", get(get_usage))
        .route("/admin/alerts", get(get_alerts))
        .route("/admin/reset", post(post_reset))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}

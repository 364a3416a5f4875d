//! # tracker-api — Axum Service for the Grant Tracker
//!
//! Request handling and form validation for the tracker: ticket detail and
//! create/edit forms with media and expense formsets, topic pages, the
//! per-user reporting page, the transaction list and the staff endpoints.
//! Pages answer with JSON page contexts.
//!
//! ## API Surface
//!
//! | Path                         | Module                      |
//! |------------------------------|-----------------------------|
//! | `/ticket/*`                  | [`routes::tickets`]         |
//! | `/topics/`, `/topic/*`, `/topics.js` | [`routes::topics`]  |
//! | `/users/`, `/user/*`         | [`routes::users`]           |
//! | `/transactions/`             | [`routes::transactions`]    |
//! | `/admin/*`                   | [`routes::admin`]           |
//! | `/openapi.json`              | [`openapi`]                 |
//! | `/health/*`                  | probes, no auth             |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod bootstrap;
pub mod db;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod messages;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes (`/health/*`) are mounted outside the auth middleware
/// so they remain accessible without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = ApiMetrics::new();

    let api = Router::new()
        .merge(routes::tickets::router())
        .merge(routes::topics::router())
        .merge(routes::users::router())
        .merge(routes::transactions::router())
        .merge(routes::admin::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state.clone());

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .with_state(state);

    Router::new().merge(health).merge(api)
}

/// Liveness probe: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 unless a configured database fails to respond.
async fn readiness(State(state): State<AppState>) -> Response {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = sqlx::query("SELECT 1").execute(pool).await {
            tracing::warn!("Database health check failed: {e}");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    "ready".into_response()
}

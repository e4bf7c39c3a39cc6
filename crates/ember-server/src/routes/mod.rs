//! API route modules.

pub mod answers;
pub mod check_in;
pub mod focus;
pub mod health;
pub mod report;
pub mod summary;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::session_middleware;
use crate::state::AppState;

/// Create the main router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes (no session)
    let public_routes = Router::new().route("/health", get(health::health_check));

    // Session-scoped routes (require x-session-id)
    let session_routes = Router::new()
        .merge(answers::router())
        .merge(focus::router())
        .merge(check_in::router())
        .merge(summary::router())
        .merge(report::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api", session_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

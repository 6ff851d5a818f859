//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and request/response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/join", post(join_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/timer", get(timer_handler))
        .route("/timer/events", post(timer_event_handler))
        .route("/sessions", get(sessions_handler))
        .route("/profile", get(profile_handler))
        .route("/profile/settings", post(settings_handler))
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

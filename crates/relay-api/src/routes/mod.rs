//! Route definitions
//!
//! All API routes organized by domain and mounted under /api.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::{auth, health, messages};
use crate::state::AppState;

/// Create the main API router (excluding health, which bypasses rate limiting)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api", api_routes())
}

/// Health check routes (exported separately to bypass rate limiting)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API routes
fn api_routes() -> Router<AppState> {
    Router::new().merge(auth_routes()).merge(message_routes())
}

/// Authentication routes
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::current_user))
}

/// Message history routes
fn message_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", get(messages::get_recent_messages))
        .route("/messages/mine", get(messages::get_my_messages))
        .route("/messages/:message_id", delete(messages::delete_message))
}

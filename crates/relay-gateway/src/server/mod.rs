//! Gateway server setup
//!
//! Provides the WebSocket server configuration and routes.

mod handler;
mod state;

pub use handler::gateway_handler;
pub use state::GatewayState;

use crate::auth::{AuthThrottle, JwtCredentialValidator};
use crate::connection::SessionRegistry;
use crate::lifecycle::ConnectionLifecycle;
use crate::presence::PresenceCoordinator;
use crate::router::MessageRouter;
use axum::{routing::get, Router};
use relay_common::{AppConfig, AppError, JwtService};
use relay_core::{MessageRepository, SnowflakeGenerator};
use relay_db::{create_pool, PgMessageRepository, PgUserRepository};
use relay_service::ServiceContextBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/ws", get(gateway_handler))
        .route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Initialize all dependencies and create `GatewayState`
///
/// Schema migrations belong to the API server; the gateway opens a pool
/// against the already-migrated database.
pub async fn create_gateway_state(config: AppConfig) -> Result<GatewayState, AppError> {
    // Create database pool
    tracing::info!("Connecting to PostgreSQL...");
    let db_config = relay_db::DatabaseConfig::from(&config.database);
    let pool = create_pool(&db_config)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    // Create JWT service
    let jwt_service = Arc::new(JwtService::new(&config.jwt.secret, config.jwt.token_expiry));

    // Create Snowflake generator
    let snowflake_generator = Arc::new(SnowflakeGenerator::new(config.snowflake.worker_id));

    // Create repositories
    let user_repo = Arc::new(PgUserRepository::new(pool.clone()));
    let message_repo: Arc<dyn MessageRepository> = Arc::new(PgMessageRepository::new(
        pool.clone(),
        snowflake_generator.clone(),
    ));

    // Build service context
    let service_context = ServiceContextBuilder::new()
        .pool(pool)
        .user_repo(user_repo)
        .message_repo(message_repo.clone())
        .jwt_service(jwt_service)
        .snowflake_generator(snowflake_generator.clone())
        .history(config.history.clone())
        .build()
        .map_err(AppError::from)?;

    // Wire the gateway components around one shared registry
    let registry = SessionRegistry::new_shared();
    let presence = PresenceCoordinator::new_shared(registry.clone());
    let router = Arc::new(MessageRouter::new(
        registry.clone(),
        message_repo,
        snowflake_generator,
    ));

    let validator = Arc::new(JwtCredentialValidator::new(Arc::new(service_context)));
    let lifecycle = Arc::new(ConnectionLifecycle::new(
        registry.clone(),
        presence.clone(),
        AuthThrottle::new(&config.throttle),
        validator,
        Duration::from_secs(config.gateway.auth_timeout_secs),
    ));

    Ok(GatewayState::new(
        registry, router, presence, lifecycle, config,
    ))
}

/// Run the gateway server
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to bind to {addr}: {e}")))?;

    tracing::info!("Gateway listening on ws://{}/ws", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Server error: {e}")))?;

    Ok(())
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config
        .gateway
        .bind_addr()
        .parse::<SocketAddr>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid bind address: {e}")))?;

    // Create gateway state
    let state = create_gateway_state(config).await?;

    // Build application
    let app = create_app(state);

    // Run server
    run_server(app, addr).await
}

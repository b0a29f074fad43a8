//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::SessionRegistry;
use crate::lifecycle::ConnectionLifecycle;
use crate::presence::PresenceCoordinator;
use crate::router::MessageRouter;
use relay_common::AppConfig;
use std::sync::Arc;

/// Gateway application state
///
/// Holds all shared dependencies for the gateway server.
#[derive(Clone)]
pub struct GatewayState {
    /// Session registry for live connections
    registry: Arc<SessionRegistry>,
    /// Router for public and private messages
    router: Arc<MessageRouter>,
    /// Roster and typing coordinator
    presence: Arc<PresenceCoordinator>,
    /// Admission and retirement manager
    lifecycle: Arc<ConnectionLifecycle>,
    /// Application configuration
    config: Arc<AppConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    #[must_use]
    pub fn new(
        registry: Arc<SessionRegistry>,
        router: Arc<MessageRouter>,
        presence: Arc<PresenceCoordinator>,
        lifecycle: Arc<ConnectionLifecycle>,
        config: AppConfig,
    ) -> Self {
        Self {
            registry,
            router,
            presence,
            lifecycle,
            config: Arc::new(config),
        }
    }

    /// Get the session registry
    #[must_use]
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Get the message router
    #[must_use]
    pub fn router(&self) -> &MessageRouter {
        &self.router
    }

    /// Get the presence coordinator
    #[must_use]
    pub fn presence(&self) -> &PresenceCoordinator {
        &self.presence
    }

    /// Get the connection lifecycle manager
    #[must_use]
    pub fn lifecycle(&self) -> &ConnectionLifecycle {
        &self.lifecycle
    }

    /// Get the application configuration
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("config", &"AppConfig")
            .finish()
    }
}

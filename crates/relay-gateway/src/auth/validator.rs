//! Credential validation
//!
//! The gateway treats tokens as opaque; validation is delegated to the
//! auth service through the [`CredentialValidator`] trait so lifecycle
//! tests can stub it out.

use async_trait::async_trait;
use relay_core::{DomainError, Identity};
use relay_service::{AuthService, ServiceContext, ServiceError};
use std::sync::Arc;
use thiserror::Error;

/// Why a credential was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token in the handshake query or Authorization header
    #[error("Authentication required")]
    MissingToken,

    /// Token did not decode, expired, or names no known user
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Token is valid but the account is deactivated
    #[error("Account is disabled")]
    AccountDisabled,
}

/// Validates handshake credentials into an identity
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Resolve a raw token to the identity behind it
    async fn validate(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Production validator backed by the JWT auth service
pub struct JwtCredentialValidator {
    context: Arc<ServiceContext>,
}

impl JwtCredentialValidator {
    #[must_use]
    pub fn new(context: Arc<ServiceContext>) -> Self {
        Self { context }
    }
}

#[async_trait]
impl CredentialValidator for JwtCredentialValidator {
    async fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let service = AuthService::new(&self.context);

        let user = service.get_user_from_token(token).await.map_err(|err| {
            if matches!(err, ServiceError::Domain(DomainError::AccountDisabled)) {
                return AuthError::AccountDisabled;
            }
            tracing::debug!(error = %err, "Token validation failed");
            AuthError::InvalidToken
        })?;

        Ok(user.identity())
    }
}

impl std::fmt::Debug for JwtCredentialValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCredentialValidator").finish()
    }
}

//! Authentication service
//!
//! Handles registration, login with account lockout, and bearer token
//! validation for both the HTTP API and the websocket handshake.

use chrono::{Duration, Utc};
use relay_common::auth::{hash_password, validate_password_strength, verify_password};
use relay_common::AppError;
use relay_core::entities::User;
use relay_core::{DomainError, Snowflake};
use tracing::{info, instrument, warn};
use validator::ValidateEmail;

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Usernames are stored lowercase; bounds apply after trimming.
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;

/// Consecutive failures before an account locks, and for how long.
const LOCK_THRESHOLD: i32 = 5;
const LOCK_DURATION_HOURS: i64 = 2;

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Register a new user
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterRequest) -> ServiceResult<AuthResponse> {
        let username = normalize_username(&request.username);
        validate_username(&username)?;

        if let Some(email) = &request.email {
            if !email.validate_email() {
                return Err(DomainError::InvalidEmail.into());
            }
        }

        validate_password_strength(&request.password).map_err(|err| match err {
            AppError::Validation(reason) => ServiceError::Domain(DomainError::WeakPassword(reason)),
            other => ServiceError::App(other),
        })?;

        if self.ctx.user_repo().username_exists(&username).await? {
            return Err(DomainError::UsernameTaken.into());
        }

        let password_hash =
            hash_password(&request.password).map_err(|e| ServiceError::internal(e.to_string()))?;

        let user = User::new(self.ctx.generate_id(), username, request.email);
        self.ctx.user_repo().create(&user, &password_hash).await?;

        info!(user_id = %user.id, "User registered");

        let token = self
            .ctx
            .jwt_service()
            .issue_token(user.id)
            .map_err(ServiceError::from)?;

        Ok(AuthResponse::new(token, UserResponse::from(&user)))
    }

    /// Login with username and password
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> ServiceResult<AuthResponse> {
        let username = normalize_username(&request.username);

        let user = self
            .ctx
            .user_repo()
            .find_by_username(&username)
            .await?
            .ok_or_else(|| {
                warn!(username = %username, "Login failed: unknown username");
                ServiceError::Domain(DomainError::InvalidCredentials)
            })?;

        // A live lock short-circuits before any password work; attempts made
        // while locked neither extend the lock nor move the counter.
        if let Some(until) = user.locked_until {
            if until > Utc::now() {
                warn!(user_id = %user.id, until = %until, "Login rejected: account locked");
                return Err(DomainError::AccountLocked { until }.into());
            }
        }

        if !user.is_active {
            warn!(user_id = %user.id, "Login rejected: account disabled");
            return Err(DomainError::AccountDisabled.into());
        }

        let password_hash = self
            .ctx
            .user_repo()
            .get_password_hash(user.id)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %user.id, "Login failed: no password hash");
                ServiceError::Domain(DomainError::InvalidCredentials)
            })?;

        let is_valid = verify_password(&request.password, &password_hash)
            .map_err(|e| ServiceError::internal(e.to_string()))?;

        if !is_valid {
            let lock_until = Utc::now() + Duration::hours(LOCK_DURATION_HOURS);
            let attempts = self
                .ctx
                .user_repo()
                .record_login_failure(user.id, LOCK_THRESHOLD, lock_until)
                .await?;

            warn!(user_id = %user.id, attempts, "Login failed: invalid password");

            if attempts >= LOCK_THRESHOLD {
                return Err(DomainError::AccountLocked { until: lock_until }.into());
            }
            return Err(DomainError::InvalidCredentials.into());
        }

        self.ctx.user_repo().record_login_success(user.id).await?;

        info!(user_id = %user.id, "User logged in");

        let token = self
            .ctx
            .jwt_service()
            .issue_token(user.id)
            .map_err(ServiceError::from)?;

        Ok(AuthResponse::new(token, UserResponse::from(&user)))
    }

    /// Look up the profile behind a validated token subject
    #[instrument(skip(self))]
    pub async fn current_user(&self, user_id: Snowflake) -> ServiceResult<UserResponse> {
        let user = self.load_active_user(user_id).await?;
        Ok(UserResponse::from(&user))
    }

    /// Validate a bearer token and return the subject's user ID
    #[instrument(skip(self, token))]
    pub async fn validate_token(&self, token: &str) -> ServiceResult<Snowflake> {
        let claims = self
            .ctx
            .jwt_service()
            .validate_token(token)
            .map_err(ServiceError::from)?;

        claims.user_id().map_err(ServiceError::from)
    }

    /// Resolve a bearer token to its account
    ///
    /// Shared by the HTTP API and the websocket handshake; a token whose
    /// subject no longer resolves to an active account is invalid.
    #[instrument(skip(self, token))]
    pub async fn get_user_from_token(&self, token: &str) -> ServiceResult<User> {
        let user_id = self.validate_token(token).await?;
        self.load_active_user(user_id).await
    }

    async fn load_active_user(&self, user_id: Snowflake) -> ServiceResult<User> {
        let user = self
            .ctx
            .user_repo()
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::App(AppError::InvalidToken))?;

        if !user.is_active {
            return Err(DomainError::AccountDisabled.into());
        }

        Ok(user)
    }
}

fn normalize_username(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    let length = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
        return Err(DomainError::InvalidUsername(format!(
            "username must be {USERNAME_MIN}-{USERNAME_MAX} characters"
        )));
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DomainError::InvalidUsername(
            "username may only contain letters, digits, and underscore".to_string(),
        ));
    }

    Ok(())
}

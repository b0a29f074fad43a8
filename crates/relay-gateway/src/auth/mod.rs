//! Connection authentication
//!
//! Token validation behind the [`CredentialValidator`] trait and the
//! per-address sliding-window throttle that runs before it.

mod throttle;
mod validator;

pub use throttle::AuthThrottle;
pub use validator::{AuthError, CredentialValidator, JwtCredentialValidator};

//! Request DTOs for API endpoints
//!
//! All request DTOs implement `Deserialize` and `Validate` for input validation.

use serde::Deserialize;
use validator::Validate;

/// User registration request
///
/// Username charset and casing rules are enforced in the auth service,
/// which normalizes before checking; the DTO only bounds lengths.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 30, message = "Username must be 3-30 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, max = 72, message = "Password must be 8-72 characters"))]
    pub password: String,
}

/// User login request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_bounds_lengths() {
        let short = RegisterRequest {
            username: "ab".to_string(),
            email: None,
            password: "Valid1234!".to_string(),
        };
        assert!(short.validate().is_err());

        let ok = RegisterRequest {
            username: "alice_01".to_string(),
            email: Some("alice@example.com".to_string()),
            password: "Valid1234!".to_string(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn register_request_rejects_bad_email() {
        let bad = RegisterRequest {
            username: "alice".to_string(),
            email: Some("not-an-email".to_string()),
            password: "Valid1234!".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn login_request_requires_both_fields() {
        let empty = LoginRequest {
            username: String::new(),
            password: "pw".to_string(),
        };
        assert!(empty.validate().is_err());
    }
}

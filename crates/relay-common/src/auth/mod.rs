//! Authentication utilities

mod jwt;
mod password;

pub use jwt::{AuthToken, Claims, JwtService};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordService};

//! Business logic services
//!
//! Each service borrows a [`ServiceContext`] and exposes the use cases for
//! one area of the system.

pub mod auth;
pub mod context;
pub mod error;
pub mod message;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::AuthService;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use message::MessageService;

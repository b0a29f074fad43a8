//! Domain entities - core business objects

mod message;
mod user;

pub use message::{Message, NewMessage, Visibility};
pub use user::{Identity, User};

//! Database models
//!
//! Row structs with SQLx `FromRow` derives, one per table.

mod message;
mod user;

pub use message::MessageModel;
pub use user::UserModel;

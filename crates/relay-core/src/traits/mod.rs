//! Repository traits (ports)

mod repositories;

pub use repositories::{HistoryQuery, MessageRepository, RepoResult, UserRepository};

//! Value objects - immutable types that represent domain concepts

mod message_text;
mod snowflake;

pub use message_text::MessageText;
pub use snowflake::{Snowflake, SnowflakeGenerator, SnowflakeParseError};

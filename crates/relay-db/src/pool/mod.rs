//! Database connection pool management

mod postgres;

pub use postgres::{create_pool, create_pool_from_env, run_migrations, DatabaseConfig, MIGRATOR};

// Re-export PgPool for convenience
pub use sqlx::postgres::PgPool;

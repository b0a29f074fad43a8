//! PostgreSQL implementation of MessageRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::{Message, NewMessage};
use relay_core::traits::{HistoryQuery, MessageRepository, RepoResult};
use relay_core::value_objects::{Snowflake, SnowflakeGenerator};

use crate::mappers::MessageInsert;
use crate::models::MessageModel;

use super::error::{map_db_error, message_not_found};

/// PostgreSQL implementation of MessageRepository
///
/// Ids and timestamps are assigned here at insert time, from the process-wide
/// snowflake generator, so a stored message leaves the repository fully formed.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
    id_generator: Arc<SnowflakeGenerator>,
}

impl PgMessageRepository {
    /// Create a new PgMessageRepository
    pub fn new(pool: PgPool, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self { pool, id_generator }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    #[instrument(skip(self, message), fields(author_id = %message.author_id))]
    async fn insert(&self, message: NewMessage) -> RepoResult<Message> {
        let message = Message {
            id: self.id_generator.generate(),
            author_id: message.author_id,
            author_name: message.author_name,
            text: message.text,
            visibility: message.visibility,
            recipient_id: message.recipient_id,
            created_at: Utc::now(),
            edited_at: None,
        };

        let row = MessageInsert::new(&message);
        sqlx::query(
            r"
            INSERT INTO messages (id, author_id, author_name, text, visibility, recipient_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(row.id)
        .bind(row.author_id)
        .bind(row.author_name)
        .bind(row.text)
        .bind(row.visibility)
        .bind(row.recipient_id)
        .bind(row.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(message)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Message>> {
        let result = sqlx::query_as::<_, MessageModel>(
            r"
            SELECT id, author_id, author_name, text, visibility, recipient_id,
                   created_at, edited_at, deleted_at
            FROM messages
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(Message::from))
    }

    #[instrument(skip(self))]
    async fn query_recent(&self, query: HistoryQuery) -> RepoResult<Vec<Message>> {
        // Page-size policy lives in the service layer; the repository only
        // guards against a nonsensical bind value.
        let limit = query.limit.max(1);

        let results = match query.before {
            Some(before) => {
                // Fetch messages before cursor (scrolling up)
                sqlx::query_as::<_, MessageModel>(
                    r"
                    SELECT id, author_id, author_name, text, visibility, recipient_id,
                           created_at, edited_at, deleted_at
                    FROM messages
                    WHERE visibility = 'public' AND created_at < $1 AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $2
                    ",
                )
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                // Fetch latest messages (no cursor)
                sqlx::query_as::<_, MessageModel>(
                    r"
                    SELECT id, author_id, author_name, text, visibility, recipient_id,
                           created_at, edited_at, deleted_at
                    FROM messages
                    WHERE visibility = 'public' AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $1
                    ",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self))]
    async fn query_for_identity(
        &self,
        identity_id: Snowflake,
        query: HistoryQuery,
    ) -> RepoResult<Vec<Message>> {
        let limit = query.limit.max(1);
        let id = identity_id.into_inner();

        let results = match query.before {
            Some(before) => {
                sqlx::query_as::<_, MessageModel>(
                    r"
                    SELECT id, author_id, author_name, text, visibility, recipient_id,
                           created_at, edited_at, deleted_at
                    FROM messages
                    WHERE (visibility = 'public' OR author_id = $1 OR recipient_id = $1)
                      AND created_at < $2 AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $3
                    ",
                )
                .bind(id)
                .bind(before)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MessageModel>(
                    r"
                    SELECT id, author_id, author_name, text, visibility, recipient_id,
                           created_at, edited_at, deleted_at
                    FROM messages
                    WHERE (visibility = 'public' OR author_id = $1 OR recipient_id = $1)
                      AND deleted_at IS NULL
                    ORDER BY id DESC
                    LIMIT $2
                    ",
                )
                .bind(id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        Ok(results.into_iter().map(Message::from).collect())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let result = sqlx::query(
            r"
            UPDATE messages
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(message_not_found(id));
        }

        Ok(())
    }
}

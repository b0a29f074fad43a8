//! Message history service
//!
//! Read-side queries over the durable store plus author-only deletion.
//! Live sends go through the gateway router; this service never inserts.

use chrono::{DateTime, Utc};
use relay_core::traits::HistoryQuery;
use relay_core::{DomainError, Snowflake};
use tracing::{info, instrument};

use crate::dto::{MessageHistoryResponse, MessageResponse};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};

/// Upper bound on the configurable page size.
const HARD_PAGE_CAP: i64 = 100;

/// Message history service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Public history page, oldest-first, with a continuation flag
    #[instrument(skip(self))]
    pub async fn recent_messages(
        &self,
        limit: Option<i64>,
        before: Option<DateTime<Utc>>,
    ) -> ServiceResult<MessageHistoryResponse> {
        let limit = self.page_limit(limit);
        // One extra row answers has_more without a second query.
        let query = HistoryQuery {
            before,
            limit: limit + 1,
        };
        let rows = self.ctx.message_repo().query_recent(query).await?;

        Ok(Self::to_page(rows, limit))
    }

    /// History visible to one identity (public, authored, or received),
    /// oldest-first
    #[instrument(skip(self))]
    pub async fn messages_for_identity(
        &self,
        identity_id: Snowflake,
        limit: Option<i64>,
        before: Option<DateTime<Utc>>,
    ) -> ServiceResult<MessageHistoryResponse> {
        let limit = self.page_limit(limit);
        let query = HistoryQuery {
            before,
            limit: limit + 1,
        };
        let rows = self
            .ctx
            .message_repo()
            .query_for_identity(identity_id, query)
            .await?;

        Ok(Self::to_page(rows, limit))
    }

    /// Delete a message; only its author may do so
    #[instrument(skip(self))]
    pub async fn delete_message(
        &self,
        message_id: Snowflake,
        caller_id: Snowflake,
    ) -> ServiceResult<()> {
        let message = self
            .ctx
            .message_repo()
            .find_by_id(message_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Message", message_id.to_string()))?;

        if message.author_id != caller_id {
            return Err(DomainError::NotMessageAuthor.into());
        }

        self.ctx.message_repo().delete(message_id).await?;

        info!(message_id = %message_id, user_id = %caller_id, "Message deleted");
        Ok(())
    }

    /// Effective page size: the request may shrink the configured page but
    /// never grow it.
    fn page_limit(&self, requested: Option<i64>) -> i64 {
        let max = self.ctx.history_config().page_limit.clamp(1, HARD_PAGE_CAP);
        requested.unwrap_or(max).clamp(1, max)
    }

    /// Turn a newest-first overfetched row set into an oldest-first page
    fn to_page(mut rows: Vec<relay_core::entities::Message>, limit: i64) -> MessageHistoryResponse {
        let page_size = usize::try_from(limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > page_size;
        rows.truncate(page_size);
        rows.reverse();

        MessageHistoryResponse::new(rows.iter().map(MessageResponse::from).collect(), has_more)
    }
}

//! Message history handlers
//!
//! Endpoints for paging stored history and deleting own messages.

use axum::{
    extract::{Path, State},
    Json,
};
use relay_service::{MessageHistoryResponse, MessageService};

use crate::extractors::{AuthUser, Pagination};
use crate::response::{ApiError, ApiResult, NoContent};
use crate::state::AppState;

/// Get recent public messages
///
/// GET /api/messages
pub async fn get_recent_messages(
    State(state): State<AppState>,
    pagination: Pagination,
) -> ApiResult<Json<MessageHistoryResponse>> {
    let service = MessageService::new(state.service_context());
    let response = service
        .recent_messages(pagination.limit, pagination.before)
        .await?;
    Ok(Json(response))
}

/// Get messages visible to the authenticated user
///
/// GET /api/messages/mine
pub async fn get_my_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    pagination: Pagination,
) -> ApiResult<Json<MessageHistoryResponse>> {
    let service = MessageService::new(state.service_context());
    let response = service
        .messages_for_identity(auth.user_id, pagination.limit, pagination.before)
        .await?;
    Ok(Json(response))
}

/// Delete own message
///
/// DELETE /api/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(message_id): Path<String>,
) -> ApiResult<NoContent> {
    let message_id = message_id
        .parse()
        .map_err(|_| ApiError::invalid_path("Invalid message_id format"))?;

    let service = MessageService::new(state.service_context());
    service.delete_message(message_id, auth.user_id).await?;
    Ok(NoContent)
}

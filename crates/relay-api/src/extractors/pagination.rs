//! Pagination extractor
//!
//! Extracts history pagination parameters from query strings. The cursor
//! is an exclusive RFC 3339 timestamp; page-size policy lives in the
//! message service.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::response::ApiError;

/// Raw pagination query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    /// Get messages strictly older than this RFC 3339 timestamp
    #[serde(default)]
    pub before: Option<String>,
    /// Maximum number of messages to return
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Parsed pagination parameters
#[derive(Debug, Clone, Copy, Default)]
pub struct Pagination {
    /// Get messages strictly older than this timestamp
    pub before: Option<DateTime<Utc>>,
    /// Maximum number of messages to return
    pub limit: Option<i64>,
}

impl TryFrom<PaginationParams> for Pagination {
    type Error = ApiError;

    fn try_from(params: PaginationParams) -> Result<Self, Self::Error> {
        let before = params
            .before
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| ApiError::invalid_query("Invalid 'before' cursor format"))
            })
            .transpose()?;

        Ok(Pagination {
            before,
            limit: params.limit,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<PaginationParams>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::invalid_query(e.to_string()))?;

        Pagination::try_from(params)
    }
}

use axum::body::Bytes;
use serde::Deserialize;

use skillbank_types::api::ReviewRequest;
use skillbank_types::models::SortOrder;

use crate::error::ApiError;

pub const DEFAULT_PAGE: u32 = 50;

/// `?limit=&order=` on the per-user listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    #[serde(default)]
    pub order: SortOrder,
}

impl ListQuery {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE)
    }
}

/// `?status=&order=&limit=` on the admin listings.
#[derive(Debug, Deserialize)]
pub struct StatusQuery<S> {
    pub status: Option<S>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub order: SortOrder,
}

impl<S> StatusQuery<S> {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE)
    }
}

/// Review endpoints accept an empty body or `{"notes": "..."}`.
pub fn review_notes(body: &Bytes) -> Result<Option<String>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let review: ReviewRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid review body: {e}")))?;
    Ok(review.notes)
}

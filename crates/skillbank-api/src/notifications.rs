use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use skillbank_types::api::NotificationListResponse;
use skillbank_types::models::Principal;

use crate::convert;
use crate::error::{ApiError, blocking};
use crate::params::DEFAULT_PAGE;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread: bool,
    pub limit: Option<u32>,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let inbox = blocking(move || {
        ledger.inbox(&principal, query.unread, query.limit.unwrap_or(DEFAULT_PAGE))
    })
    .await?;

    Ok(Json(NotificationListResponse {
        unread: inbox.unread,
        notifications: convert::many(inbox.notifications, convert::notification)?,
    }))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(notification_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let ledger = state.ledger.clone();
    blocking(move || ledger.mark_read(&principal, &notification_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Value>, ApiError> {
    let ledger = state.ledger.clone();
    let updated = blocking(move || ledger.mark_all_read(&principal)).await?;
    Ok(Json(json!({ "updated": updated })))
}

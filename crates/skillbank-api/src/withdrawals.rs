use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use skillbank_types::api::{CreateWithdrawalRequest, WithdrawalResponse};
use skillbank_types::models::{Principal, WithdrawalStatus};

use crate::convert;
use crate::error::{ApiError, blocking};
use crate::params::{ListQuery, StatusQuery, review_notes};
use crate::state::AppState;

/// POST /withdrawals
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateWithdrawalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = state.ledger.clone();
    let row = blocking(move || {
        ledger.request_withdrawal(&principal, req.amount, &req.destination, req.notes.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(convert::withdrawal(row)?)))
}

/// GET /withdrawals
pub async fn my_withdrawals(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<WithdrawalResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows =
        blocking(move || ledger.my_withdrawals(&principal, query.order, query.limit())).await?;
    Ok(Json(convert::many(rows, convert::withdrawal)?))
}

/// GET /admin/withdrawals
pub async fn all_withdrawals(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StatusQuery<WithdrawalStatus>>,
) -> Result<Json<Vec<WithdrawalResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows = blocking(move || {
        ledger.all_withdrawals(&principal, query.status, query.order, query.limit())
    })
    .await?;
    Ok(Json(convert::many(rows, convert::withdrawal)?))
}

/// POST /admin/withdrawals/{id}/approve
pub async fn approve_withdrawal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<String>,
    body: Bytes,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let notes = review_notes(&body)?;
    let ledger = state.ledger.clone();
    let row = blocking(move || {
        ledger.approve_withdrawal(&principal, &request_id, notes.as_deref())
    })
    .await?;
    Ok(Json(convert::withdrawal(row)?))
}

/// POST /admin/withdrawals/{id}/reject
pub async fn reject_withdrawal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(request_id): Path<String>,
    body: Bytes,
) -> Result<Json<WithdrawalResponse>, ApiError> {
    let notes = review_notes(&body)?;
    let ledger = state.ledger.clone();
    let row = blocking(move || {
        ledger.reject_withdrawal(&principal, &request_id, notes.as_deref())
    })
    .await?;
    Ok(Json(convert::withdrawal(row)?))
}

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use skillbank_types::api::{BalanceResponse, LedgerEntryResponse, ReconciliationResponse};
use skillbank_types::models::Principal;

use crate::convert;
use crate::error::{ApiError, blocking};
use crate::params::ListQuery;
use crate::state::AppState;

/// GET /wallet
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let row = blocking(move || ledger.balance(&principal)).await?;
    Ok(Json(convert::balance(row)?))
}

/// GET /wallet/entries
pub async fn get_entries(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<LedgerEntryResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows = blocking(move || ledger.entries(&principal, query.order, query.limit())).await?;
    Ok(Json(convert::many(rows, convert::entry)?))
}

/// GET /wallet/reconcile/{user_id}
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<uuid::Uuid>,
) -> Result<Json<ReconciliationResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let report = blocking(move || ledger.reconcile(&principal, &user_id.to_string())).await?;
    Ok(Json(convert::reconciliation(report)?))
}

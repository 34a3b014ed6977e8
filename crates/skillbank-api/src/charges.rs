use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use skillbank_ledger::deposits::{ChargeClaim, ProofRef};
use skillbank_types::api::{ChargeResponse, SubmitChargeRequest};
use skillbank_types::models::{ChargeStatus, Principal};

use crate::convert;
use crate::error::{ApiError, blocking};
use crate::params::{ListQuery, StatusQuery, review_notes};
use crate::state::AppState;

/// POST /charges: Claim a deposit against an uploaded proof.
pub async fn submit_charge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SubmitChargeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let sha256 = state
        .proofs
        .digest(&req.proof_path)
        .await
        .map_err(|e| ApiError::internal("Failed to read proof", e))?
        .ok_or_else(|| ApiError::BadRequest("proof_path does not name an uploaded proof".into()))?;

    let claim = ChargeClaim {
        amount: req.amount,
        payer_phone: req.payer_phone,
        external_txn_id: req.external_txn_id,
        proof: ProofRef {
            path: req.proof_path,
            sha256,
        },
    };

    let ledger = state.ledger.clone();
    let row = blocking(move || ledger.submit_charge(&principal, &claim)).await?;
    Ok((StatusCode::CREATED, Json(convert::charge(row)?)))
}

/// GET /charges
pub async fn my_charges(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ChargeResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows = blocking(move || ledger.my_charges(&principal, query.order, query.limit())).await?;
    Ok(Json(convert::many(rows, convert::charge)?))
}

/// GET /admin/charges
pub async fn all_charges(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<StatusQuery<ChargeStatus>>,
) -> Result<Json<Vec<ChargeResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows = blocking(move || {
        ledger.all_charges(&principal, query.status, query.order, query.limit())
    })
    .await?;
    Ok(Json(convert::many(rows, convert::charge)?))
}

/// POST /admin/charges/{id}/verify
pub async fn verify_charge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(charge_id): Path<String>,
    body: Bytes,
) -> Result<Json<ChargeResponse>, ApiError> {
    let notes = review_notes(&body)?;
    let ledger = state.ledger.clone();
    let row =
        blocking(move || ledger.verify_charge(&principal, &charge_id, notes.as_deref())).await?;
    Ok(Json(convert::charge(row)?))
}

/// POST /admin/charges/{id}/reject
pub async fn reject_charge(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(charge_id): Path<String>,
    body: Bytes,
) -> Result<Json<ChargeResponse>, ApiError> {
    let notes = review_notes(&body)?;
    let ledger = state.ledger.clone();
    let row =
        blocking(move || ledger.reject_charge(&principal, &charge_id, notes.as_deref())).await?;
    Ok(Json(convert::charge(row)?))
}

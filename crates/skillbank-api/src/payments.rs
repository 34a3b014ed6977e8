use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use skillbank_types::api::{PaymentResponse, SendPaymentRequest};
use skillbank_types::models::Principal;

use crate::convert;
use crate::error::{ApiError, blocking};
use crate::params::ListQuery;
use crate::state::AppState;

/// POST /payments
pub async fn send_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<SendPaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let ledger = state.ledger.clone();
    let row = blocking(move || {
        ledger.send_payment(
            &principal,
            &req.recipient_username,
            req.amount,
            req.note.as_deref(),
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(convert::payment(row)?)))
}

/// GET /payments: Sent and received.
pub async fn my_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PaymentResponse>>, ApiError> {
    let ledger = state.ledger.clone();
    let rows = blocking(move || ledger.my_payments(&principal, query.order, query.limit())).await?;
    Ok(Json(convert::many(rows, convert::payment)?))
}

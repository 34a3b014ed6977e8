use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use skillbank_types::api::Claims;

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// Validates the bearer token and attaches the caller's [`Principal`] to the
/// request. Roles are read from the database here, once per request.
///
/// [`Principal`]: skillbank_types::models::Principal
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized
    })?
    .claims;

    let ledger = state.ledger.clone();
    let principal = blocking(move || ledger.resolve_principal(claims.sub))
        .await
        .map_err(|e| match e {
            // Token for an account that no longer exists.
            ApiError::NotFound(_) => ApiError::Unauthorized,
            other => other,
        })?;

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

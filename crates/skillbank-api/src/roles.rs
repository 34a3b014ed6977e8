use axum::{Extension, Json, extract::State};

use skillbank_types::api::{AssignRoleRequest, RolesResponse};
use skillbank_types::models::Principal;

use crate::error::{ApiError, blocking};
use crate::state::AppState;

/// POST /admin/roles: Owner only.
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<RolesResponse>, ApiError> {
    let ledger = state.ledger.clone();
    let (user, roles) = blocking(move || {
        ledger.assign_role(&principal, &req.username, req.role, req.grant)
    })
    .await?;

    let user_id = user
        .id
        .parse()
        .map_err(|e| ApiError::internal("Stored user id is not a UUID", e))?;
    Ok(Json(RolesResponse {
        user_id,
        username: user.username,
        roles,
    }))
}

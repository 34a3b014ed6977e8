use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;
use uuid::Uuid;

use skillbank_ledger::LedgerError;
use skillbank_types::api::{Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

use crate::error::{ApiError, blocking};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    if username.chars().count() < 3 || username.chars().count() > 32 {
        return Err(ApiError::BadRequest(
            "username must be 3 to 32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ApiError::BadRequest(
            "username may only contain letters, digits, '_' and '.'".into(),
        ));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "password must be at least 8 characters".into(),
        ));
    }

    let user_id = Uuid::new_v4();
    let is_owner = state
        .owner_username
        .as_deref()
        .is_some_and(|owner| owner.eq_ignore_ascii_case(&username));

    let app = state.clone();
    let name = username.clone();
    blocking(move || {
        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| LedgerError::Internal(anyhow::anyhow!("password hashing failed: {e}")))?
            .to_string();

        app.ledger.register_user(user_id, &name, &password_hash, is_owner)
    })
    .await?;

    let token = create_token(&state.jwt_secret, user_id, &username)
        .map_err(|e| ApiError::internal("Token encoding failed", e))?;
    info!("Registered user {} ({})", username, user_id);

    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id, token })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let app = state.clone();
    let principal = blocking(move || {
        let Some(user) = app.ledger.db().get_user_by_username(req.username.trim())? else {
            return Ok(None);
        };

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|e| LedgerError::Internal(anyhow::anyhow!("stored hash unreadable: {e}")))?;
        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            return Ok(None);
        }

        let user_id: Uuid = user
            .id
            .parse()
            .map_err(|e| LedgerError::Internal(anyhow::anyhow!("bad user id {}: {e}", user.id)))?;
        app.ledger.resolve_principal(user_id).map(Some)
    })
    .await?
    .ok_or(ApiError::Unauthorized)?;

    let token = create_token(&state.jwt_secret, principal.user_id, &principal.username)
        .map_err(|e| ApiError::internal("Token encoding failed", e))?;

    Ok(Json(LoginResponse {
        user_id: principal.user_id,
        username: principal.username,
        roles: principal.roles,
        token,
    }))
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

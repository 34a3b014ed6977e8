//! Proof-of-payment uploads.
//!
//! Files are stored flat per user at `{dir}/{user_id}/{unix_millis}-{uuid}.{ext}`
//! and addressed by the relative `{user_id}/{file}` path everywhere else.

use std::path::PathBuf;

use anyhow::Result;
use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::info;
use uuid::Uuid;

use skillbank_types::api::ProofUploadResponse;
use skillbank_types::models::Principal;

use crate::error::ApiError;
use crate::state::AppState;

/// 10 MB upload limit for proofs
pub const MAX_PROOF_SIZE: usize = 10 * 1024 * 1024;

const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("application/pdf", "pdf"),
];

pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

fn content_type_for(file: &str) -> &'static str {
    let ext = file.rsplit('.').next().unwrap_or("");
    ALLOWED_TYPES
        .iter()
        .find(|(_, e)| *e == ext)
        .map(|(mime, _)| *mime)
        .unwrap_or("application/octet-stream")
}

pub struct StoredProof {
    pub path: String,
    pub sha256: String,
}

pub struct ProofStore {
    dir: PathBuf,
    public_url: String,
}

impl ProofStore {
    pub async fn new(dir: PathBuf, public_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Proof storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/proofs/{}", self.public_url, path)
    }

    /// Maps a relative `{user_id}/{file}` path onto disk. Returns `None` for
    /// anything that is not exactly a UUID directory and a plain file name.
    pub fn resolve(&self, path: &str) -> Option<(Uuid, PathBuf)> {
        let (owner, file) = path.split_once('/')?;
        let owner: Uuid = owner.parse().ok()?;
        if !is_plain_file_name(file) {
            return None;
        }
        Some((owner, self.dir.join(owner.to_string()).join(file)))
    }

    pub async fn save(&self, user_id: Uuid, ext: &str, data: &[u8]) -> Result<StoredProof> {
        let user_dir = self.dir.join(user_id.to_string());
        fs::create_dir_all(&user_dir).await?;

        let file_name = format!(
            "{}-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            Uuid::new_v4(),
            ext
        );
        let mut file = fs::File::create(user_dir.join(&file_name)).await?;
        file.write_all(data).await?;
        file.flush().await?;

        Ok(StoredProof {
            path: format!("{user_id}/{file_name}"),
            sha256: sha256_hex(data),
        })
    }

    /// Contents of a stored proof, or `None` if the path is invalid or missing.
    pub async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some((_, full)) = self.resolve(path) else {
            return Ok(None);
        };
        match fs::read(&full).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// SHA-256 of a stored proof, or `None` if it does not exist.
    pub async fn digest(&self, path: &str) -> Result<Option<String>> {
        Ok(self.read(path).await?.map(|bytes| sha256_hex(&bytes)))
    }
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// POST /proofs: Raw file bytes with an image or PDF content type.
pub async fn upload_proof(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let ext = extension_for(content_type).ok_or_else(|| {
        ApiError::UnsupportedMediaType("proof must be PNG, JPEG, WebP or PDF".into())
    })?;

    // The route's body limit surfaces here as a rejection.
    let bytes = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge("proof exceeds 10 MB".into()),
        _ => ApiError::BadRequest(rejection.body_text()),
    })?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("proof file is empty".into()));
    }

    let stored = state
        .proofs
        .save(principal.user_id, ext, &bytes)
        .await
        .map_err(|e| ApiError::internal("Failed to store proof", e))?;
    info!(
        "Proof {} uploaded by {} ({} bytes)",
        stored.path,
        principal.username,
        bytes.len()
    );

    Ok((
        StatusCode::CREATED,
        Json(ProofUploadResponse {
            url: state.proofs.url_for(&stored.path),
            path: stored.path,
            sha256: stored.sha256,
        }),
    ))
}

/// GET /proofs/{user_id}/{file}: Uploader or admin only.
pub async fn get_proof(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((user_id, file)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let path = format!("{user_id}/{file}");
    let (owner, _) = state
        .proofs
        .resolve(&path)
        .ok_or_else(|| ApiError::BadRequest("invalid proof path".into()))?;

    if owner != principal.user_id && !principal.is_admin() {
        return Err(ApiError::Forbidden("not your proof".into()));
    }

    let bytes = state
        .proofs
        .read(&path)
        .await
        .map_err(|e| ApiError::internal("Failed to read proof", e))?
        .ok_or_else(|| ApiError::NotFound("proof not found".into()))?;

    Ok(([(header::CONTENT_TYPE, content_type_for(&file))], bytes))
}

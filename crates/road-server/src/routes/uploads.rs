//! Image uploads. Files land in the configured directory under a generated
//! name and are served back from the upload base path.

use std::path::PathBuf;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use road_auth::Permission;
use road_config::UploadConfig;
use road_core::ids::PREFIX_UPLOAD;

use super::created;
use crate::error::ApiError;
use crate::extract::AuthUser;
use crate::state::AppState;

/// Multipart field holding the file.
const FILE_FIELD: &str = "file";

/// Headroom above the file limit for multipart boundaries and headers.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(config: &UploadConfig) -> Router<AppState> {
    let limit = usize::try_from(config.max_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new().route(
        "/api/upload",
        post(upload).layer(DefaultBodyLimit::max(limit)),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    url: String,
    filename: String,
    size: u64,
    content_type: String,
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

fn exceeds(len: usize, max: u64) -> bool {
    u64::try_from(len).map_or(true, |len| len > max)
}

async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    user.require(Permission::RecordFieldData)?;
    let config = &state.config.uploads;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| ApiError::bad_request("file part has no content type"))?;
        if !config.allows(&content_type) {
            return Err(ApiError::bad_request(format!(
                "unsupported content type '{content_type}' (allowed: {})",
                config.allowed_types.join(", ")
            )));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if exceeds(data.len() + chunk.len(), config.max_bytes) {
                return Err(ApiError::bad_request(format!(
                    "file exceeds the {} byte limit",
                    config.max_bytes
                )));
            }
            data.extend_from_slice(&chunk);
        }
        if data.is_empty() {
            return Err(ApiError::bad_request("file is empty"));
        }

        let id = state.service.db().generate_id(PREFIX_UPLOAD).await?;
        let filename = format!("{id}.{}", extension_for(&content_type));
        let dir = PathBuf::from(&config.dir);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating upload directory {}", dir.display()))?;
        let path = dir.join(&filename);
        tokio::fs::write(&path, &data)
            .await
            .with_context(|| format!("writing upload {}", path.display()))?;

        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        let base = state.config.server.upload_base_path.trim_end_matches('/');
        tracing::info!(user_id = %user.id(), %filename, size, %content_type, "file uploaded");
        return Ok(created(UploadResponse {
            url: format!("{base}/{filename}"),
            filename,
            size,
            content_type,
        }));
    }

    Err(ApiError::bad_request(format!(
        "multipart field '{FILE_FIELD}' is required"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_follow_content_type() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(!exceeds(10, 10));
        assert!(exceeds(11, 10));
    }
}

use axum::{
    extract::State,
    http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};

use crate::db::AppState;
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Path, Query};
use crate::storage::{DeliveryMode, LinkParams};
use crate::util::attachment_disposition;

fn content_type_for(key: &str) -> &'static str {
    let ext = key.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Dereference a capability URL issued by the storage signer.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<LinkParams>,
) -> Result<Response> {
    let storage = state.storage.configured()?;
    storage.signer().verify(&key, &params)?;

    let bytes = storage
        .blobs()
        .get(&key)
        .await?
        .or_not_found(msg::FILE_NOT_FOUND)?;

    let disposition = match params.mode {
        DeliveryMode::Preview => "inline".to_string(),
        DeliveryMode::Attachment => {
            let fallback = key.rsplit('/').next().unwrap_or(&key);
            attachment_disposition(params.filename.as_deref().unwrap_or(fallback))
        }
    };

    Ok((
        [
            (CONTENT_TYPE, content_type_for(&key).to_string()),
            (CONTENT_DISPOSITION, disposition),
            (CACHE_CONTROL, "private, no-store".to_string()),
        ],
        bytes,
    )
        .into_response())
}

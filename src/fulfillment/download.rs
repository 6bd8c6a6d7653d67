use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::models::User;
use crate::storage::DeliveryMode;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadLink {
    pub download_url: String,
    pub file_name: String,
    pub expires_at: i64,
}

/// Mint a time-boxed attachment link for a purchased product.
///
/// Admins may download anything. Inactive products stay downloadable for
/// their owners. The counter is bumped only after a link was issued.
pub fn authorize_download(state: &AppState, user: &User, product_id: &str) -> Result<DownloadLink> {
    let conn = state.db.get()?;

    let product = queries::get_product_by_id(&conn, product_id)?
        .or_not_found(msg::PRODUCT_NOT_FOUND)?;

    if !user.is_admin() && !queries::user_owns_product(&conn, &user.id, &product.id)? {
        return Err(AppError::Forbidden(msg::NOT_ENTITLED.into()));
    }

    let signed = state.storage.sign(
        &product.file_key,
        DeliveryMode::Attachment,
        Some(&product.file_name),
    )?;

    queries::increment_product_downloads(&conn, &product.id)?;

    tracing::info!(user_id = %user.id, product_id = %product.id, "Download link issued");

    Ok(DownloadLink {
        download_url: signed.url,
        file_name: product.file_name,
        expires_at: signed.expires_at,
    })
}

use axum::extract::{Extension, State};
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Path, Query};
use crate::fulfillment::{self, DownloadLink};
use crate::middleware::UserContext;
use crate::models::{Product, ProductView};
use crate::storage::{DeliveryMode, Storage};

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// Project a product for the catalog, signing every preview key.
fn product_view(storage: &Storage, product: &Product) -> Result<ProductView> {
    let preview_urls = product
        .preview_keys
        .iter()
        .map(|key| storage.sign(key, DeliveryMode::Preview, None).map(|signed| signed.url))
        .collect::<Result<Vec<_>>>()?;
    Ok(ProductView::new(product, preview_urls))
}

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Vec<ProductView>>> {
    let conn = state.db.get()?;
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let products = queries::list_active_products(&conn, category)?;
    let views = products
        .iter()
        .map(|p| product_view(&state.storage, p))
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(views))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductView>> {
    let conn = state.db.get()?;
    let product = queries::get_product_by_id(&conn, &product_id)?
        .filter(|p| p.is_active)
        .or_not_found(msg::PRODUCT_NOT_FOUND)?;

    Ok(Json(product_view(&state.storage, &product)?))
}

pub async fn download_product(
    State(state): State<AppState>,
    Extension(ctx): Extension<UserContext>,
    Path(product_id): Path<String>,
) -> Result<Json<DownloadLink>> {
    let link = fulfillment::authorize_download(&state, &ctx.user, &product_id)?;
    Ok(Json(link))
}

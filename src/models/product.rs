use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// A catalog item. `file_key` and `preview_keys` are opaque object-store keys
/// and must never leave the service unsigned; use [`ProductView`] for responses.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    /// Price in the smallest currency unit
    pub price: i64,
    pub file_key: String,
    /// Original filename, used in the attachment content-disposition
    pub file_name: String,
    pub file_size: i64,
    pub preview_keys: Vec<String>,
    pub is_active: bool,
    pub downloads: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price: i64,
    pub file_key: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default)]
    pub preview_keys: Vec<String>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest(msg::TITLE_EMPTY.into()));
        }
        if self.price <= 0 {
            return Err(AppError::BadRequest(msg::PRICE_NOT_POSITIVE.into()));
        }
        Ok(())
    }
}

/// Public projection of a product: signed preview URLs instead of keys.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub price: i64,
    pub file_name: String,
    pub file_size: i64,
    pub preview_image_urls: Vec<String>,
    pub downloads: i64,
    pub created_at: i64,
}

impl ProductView {
    pub fn new(product: &Product, preview_image_urls: Vec<String>) -> Self {
        Self {
            id: product.id.clone(),
            title: product.title.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            price: product.price,
            file_name: product.file_name.clone(),
            file_size: product.file_size,
            preview_image_urls,
            downloads: product.downloads,
            created_at: product.created_at,
        }
    }
}

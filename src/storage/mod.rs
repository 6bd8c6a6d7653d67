//! Signed-URL gateway over an object store.
//!
//! Callers never see permanent object locations: every preview or download
//! goes out as a capability URL from [`UrlSigner`], served back by the
//! `/files` handler after the signature and expiry check.

mod blob;
mod signer;

pub use blob::{BlobStore, FsBlobStore, is_valid_key, new_object_key};
pub use signer::{DeliveryMode, LinkParams, SignedUrl, UrlSigner};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result, msg};

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the objects
    pub root: PathBuf,
    pub signing_secret: String,
    /// Host that serves `/files` (usually this service)
    pub public_base_url: String,
    pub url_ttl: Duration,
}

pub struct ConfiguredStorage {
    blobs: Arc<dyn BlobStore>,
    signer: UrlSigner,
}

impl ConfiguredStorage {
    pub fn new(blobs: Arc<dyn BlobStore>, signer: UrlSigner) -> Self {
        Self { blobs, signer }
    }

    pub fn blobs(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    /// Issue a capability URL for `key`.
    pub fn sign(&self, key: &str, mode: DeliveryMode, filename: Option<&str>) -> SignedUrl {
        self.signer.sign(key, mode, filename)
    }

    /// Store an upload under a fresh random key and return the key.
    pub async fn put_object(&self, folder: &str, original_filename: &str, bytes: &[u8]) -> Result<String> {
        let key = new_object_key(folder, original_filename);
        self.blobs.put(&key, bytes).await?;
        Ok(key)
    }
}

/// Object storage availability, decided once at startup.
#[derive(Clone)]
pub enum Storage {
    Configured(Arc<ConfiguredStorage>),
    Unconfigured,
}

impl Storage {
    pub fn from_config(config: Option<&StorageConfig>) -> Self {
        match config {
            Some(config) => Storage::Configured(Arc::new(ConfiguredStorage::new(
                Arc::new(FsBlobStore::new(config.root.clone())),
                UrlSigner::new(
                    config.signing_secret.as_bytes(),
                    &config.public_base_url,
                    config.url_ttl,
                ),
            ))),
            None => Storage::Unconfigured,
        }
    }

    /// The configured store, or `UpstreamUnavailable`. Never falls back to unsigned URLs.
    pub fn configured(&self) -> Result<&ConfiguredStorage> {
        match self {
            Storage::Configured(storage) => Ok(storage.as_ref()),
            Storage::Unconfigured => Err(AppError::UpstreamUnavailable(
                msg::STORAGE_NOT_CONFIGURED.into(),
            )),
        }
    }

    /// Sign `key` or fail closed.
    pub fn sign(&self, key: &str, mode: DeliveryMode, filename: Option<&str>) -> Result<SignedUrl> {
        Ok(self.configured()?.sign(key, mode, filename))
    }
}

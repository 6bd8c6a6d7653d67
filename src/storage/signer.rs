use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::crypto::{hmac_sha256_hex, verify_hmac_sha256_hex};
use crate::error::{AppError, Result, msg};

/// How the browser should treat the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryMode {
    /// Rendered inline (preview images)
    Preview,
    /// Saved as a file with the original filename
    Attachment,
}

/// A capability URL and the unix timestamp after which it stops working.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: i64,
}

/// Query parameters carried by a capability URL.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkParams {
    pub mode: DeliveryMode,
    #[serde(default)]
    pub filename: Option<String>,
    pub expires: i64,
    pub signature: String,
}

/// Issues and checks HMAC-signed, time-boxed links to objects.
///
/// The signature covers key, mode, filename and expiry, so none of them can be
/// altered without invalidating the link. There is no revocation: a link is
/// valid until `expires`.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    public_base_url: String,
    ttl: Duration,
}

fn canonical(key: &str, mode: DeliveryMode, filename: Option<&str>, expires: i64) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        key,
        mode.as_ref(),
        filename.unwrap_or(""),
        expires
    )
}

impl UrlSigner {
    pub fn new(secret: &[u8], public_base_url: &str, ttl: Duration) -> Self {
        Self {
            secret: secret.to_vec(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            ttl,
        }
    }

    pub fn sign(&self, key: &str, mode: DeliveryMode, filename: Option<&str>) -> SignedUrl {
        self.sign_at(key, mode, filename, Utc::now().timestamp())
    }

    /// Sign a link as if issued at `now` (unix seconds).
    pub fn sign_at(
        &self,
        key: &str,
        mode: DeliveryMode,
        filename: Option<&str>,
        now: i64,
    ) -> SignedUrl {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = now.saturating_add(ttl);
        let signature = hmac_sha256_hex(
            &self.secret,
            canonical(key, mode, filename, expires).as_bytes(),
        );

        let mut url = format!(
            "{}/files/{}?mode={}&expires={}&signature={}",
            self.public_base_url,
            key,
            mode.as_ref(),
            expires,
            signature
        );
        if let Some(filename) = filename {
            url.push_str("&filename=");
            url.push_str(&urlencoding::encode(filename));
        }

        SignedUrl {
            url,
            expires_at: expires,
        }
    }

    pub fn verify(&self, key: &str, params: &LinkParams) -> Result<()> {
        self.verify_at(key, params, Utc::now().timestamp())
    }

    /// Check a dereferenced link. The signature is checked before expiry so
    /// that forged links never learn anything about timing.
    pub fn verify_at(&self, key: &str, params: &LinkParams, now: i64) -> Result<()> {
        let data = canonical(key, params.mode, params.filename.as_deref(), params.expires);
        if !verify_hmac_sha256_hex(&self.secret, data.as_bytes(), &params.signature) {
            return Err(AppError::Forbidden(msg::LINK_INVALID.into()));
        }
        if now >= params.expires {
            return Err(AppError::Forbidden(msg::LINK_EXPIRED.into()));
        }
        Ok(())
    }
}

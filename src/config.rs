use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::jwt::MIN_SECRET_LEN;
use crate::payments::RazorpayConfig;
use crate::storage::StorageConfig;

/// Rate limits for public endpoints (requests per minute per IP).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Endpoints that call the payment gateway (create-intent)
    pub strict_rpm: u32,
    /// Confirmation, download, and file delivery
    pub standard_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 10,
            standard_rpm: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub dev_mode: bool,
    /// HS256 secret for verifying session tokens
    pub session_secret: String,
    /// None when Razorpay credentials are absent
    pub razorpay: Option<RazorpayConfig>,
    pub currency: String,
    pub gateway_timeout: Duration,
    /// None when storage root or signing secret is absent
    pub storage: Option<StorageConfig>,
    pub rate_limit: RateLimitConfig,
}

/// Upper bound on signed URL lifetime.
const MAX_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

const DEV_SESSION_SECRET: &str = "dev-session-secret-not-for-production";

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_rpm(name: &str, default: u32) -> u32 {
    match env_u64(name).map(u32::try_from) {
        Some(Ok(rpm)) => rpm,
        Some(Err(_)) => {
            tracing::warn!("{} out of range, using {}", name, u32::MAX);
            u32::MAX
        }
        None => default,
    }
}

fn url_ttl(secs: Option<u64>) -> Duration {
    Duration::from_secs(secs.unwrap_or(3600).max(1)).min(MAX_URL_TTL)
}

fn resolve_session_secret(value: Option<String>, dev_mode: bool) -> String {
    match value {
        Some(secret) if secret.len() >= MIN_SECRET_LEN => secret,
        Some(_) if !dev_mode => panic!(
            "SESSION_SECRET must be at least {} bytes",
            MIN_SECRET_LEN
        ),
        Some(_) => {
            tracing::warn!(
                "SESSION_SECRET shorter than {} bytes, using insecure dev secret",
                MIN_SECRET_LEN
            );
            DEV_SESSION_SECRET.to_string()
        }
        None if dev_mode => {
            tracing::warn!("SESSION_SECRET not set, using insecure dev secret");
            DEV_SESSION_SECRET.to_string()
        }
        None => panic!("SESSION_SECRET must be set outside dev mode"),
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("MARKET_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5000);

        let base_url = env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        let session_secret = resolve_session_secret(env_non_empty("SESSION_SECRET"), dev_mode);

        let razorpay = match (
            env_non_empty("RAZORPAY_KEY_ID"),
            env_non_empty("RAZORPAY_KEY_SECRET"),
        ) {
            (Some(key_id), Some(key_secret)) => Some(RazorpayConfig {
                key_id,
                key_secret,
                webhook_secret: env_non_empty("RAZORPAY_WEBHOOK_SECRET"),
            }),
            _ => {
                tracing::warn!(
                    "Razorpay not configured. Payment routes will return 503 until keys are added."
                );
                None
            }
        };

        let storage = match (
            env_non_empty("STORAGE_ROOT"),
            env_non_empty("URL_SIGNING_SECRET"),
        ) {
            (Some(root), Some(signing_secret)) => Some(StorageConfig {
                root: PathBuf::from(root),
                signing_secret,
                public_base_url: env::var("FILES_BASE_URL").unwrap_or_else(|_| base_url.clone()),
                url_ttl: url_ttl(env_u64("SIGNED_URL_TTL_SECS")),
            }),
            _ => {
                tracing::warn!(
                    "Object storage not configured. Previews and downloads will be unavailable."
                );
                None
            }
        };

        let defaults = RateLimitConfig::default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "design_market.db".to_string()),
            base_url,
            dev_mode,
            session_secret,
            razorpay,
            currency: env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "INR".to_string()),
            gateway_timeout: Duration::from_secs(env_u64("GATEWAY_TIMEOUT_SECS").unwrap_or(10)),
            storage,
            rate_limit: RateLimitConfig {
                strict_rpm: env_rpm("RATE_LIMIT_STRICT_RPM", defaults.strict_rpm),
                standard_rpm: env_rpm("RATE_LIMIT_STANDARD_RPM", defaults.standard_rpm),
            },
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

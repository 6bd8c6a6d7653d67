use jwt_simple::prelude::*;

use crate::error::{AppError, Result};

const ISSUER: &str = "design-market";

/// jwt-simple refuses HS256 keys shorter than 96 bits.
pub const MIN_SECRET_LEN: usize = 12;

/// HS256 keys for customer session tokens.
///
/// Login lives outside this service and shares the secret; `issue` exists for
/// dev seeding and tests.
#[derive(Clone)]
pub struct SessionKeys {
    key: HS256Key,
}

impl SessionKeys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            key: HS256Key::from_bytes(secret),
        }
    }

    /// Mint a session token whose subject is the user id.
    pub fn issue(&self, user_id: &str, valid_for: std::time::Duration) -> Result<String> {
        let claims = Claims::create(Duration::from_secs(valid_for.as_secs()))
            .with_issuer(ISSUER)
            .with_subject(user_id);

        self.key
            .authenticate(claims)
            .map_err(|e| AppError::Internal(format!("Failed to sign session token: {}", e)))
    }

    /// Verify a bearer token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<String> {
        let options = VerificationOptions {
            allowed_issuers: Some(HashSet::from_strings(&[ISSUER])),
            ..Default::default()
        };

        let claims = self
            .key
            .verify_token::<NoCustomClaims>(token, Some(options))
            .map_err(|e| {
                tracing::debug!("Session token rejected: {}", e);
                AppError::Unauthorized
            })?;

        claims.subject.ok_or(AppError::Unauthorized)
    }
}

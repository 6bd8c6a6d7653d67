use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result, msg};

/// Basic email sanity check: one `@`, non-empty local part, dotted domain.
fn validate_email_format(email: &str) -> Result<()> {
    let email = email.trim();
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    let (local_part, domain_part) = (parts[0], parts[1]);
    if local_part.is_empty() || local_part.contains(' ') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }
    if !domain_part.contains('.') || domain_part.starts_with('.') || domain_part.ends_with('.') {
        return Err(AppError::BadRequest(msg::INVALID_EMAIL_FORMAT.into()));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

/// A storefront account. Entitlements live in `user_entitlements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    /// Set by the registration flow; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    #[serde(default = "default_role")]
    pub role: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Customer
}

impl CreateUser {
    pub fn validate(&self) -> Result<()> {
        validate_email_format(&self.email)
    }
}

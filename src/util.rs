//! Small helpers shared by handlers and middleware.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Bearer token from the Authorization header, without the prefix.
///
/// None if the header is missing, not `Bearer`, or empty after the prefix.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Value for `Content-Disposition: attachment`.
///
/// Quotes, backslashes and control characters are dropped so the filename
/// cannot break out of the quoted string. Non-ASCII names get an ASCII
/// `filename` fallback plus the RFC 6266 `filename*=UTF-8''` form, keeping the
/// header value visible ASCII.
pub fn attachment_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| !c.is_control() && *c != '"' && *c != '\\')
        .collect();
    let safe = safe.trim();
    if safe.is_empty() {
        return "attachment".to_string();
    }

    if safe.is_ascii() {
        return format!("attachment; filename=\"{}\"", safe);
    }

    let fallback: String = safe
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(safe)
    )
}

//! HMAC signing and verification shared by payment confirmation and URL signing.

use hmac::{Hmac, Mac};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    hex::encode(mac.finalize().into_bytes())
}

/// Compare a provided hex signature against the expected HMAC in constant time.
///
/// Hex digits are compared case-insensitively by lowering the provided value
/// first. The length check leaks only the signature length, which is public
/// (always 64 hex chars for SHA-256).
pub fn verify_hmac_sha256_hex(key: &[u8], data: &[u8], provided: &str) -> bool {
    let expected = hmac_sha256_hex(key, data);
    let provided = provided.trim().to_ascii_lowercase();

    let expected_bytes = expected.as_bytes();
    let provided_bytes = provided.as_bytes();

    if expected_bytes.len() != provided_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(provided_bytes).into()
}

/// `n` random bytes from OS entropy, hex-encoded.
pub fn random_hex(n: usize) -> String {
    let mut bytes = vec![0u8; n];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

//! Opaque invite token generation and hashing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random opaque invite token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_invite_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw invite token, hex-encoded.
///
/// This is the value stored in the database as `invite.token_hash`;
/// the raw token is returned to the caller exactly once.
pub fn hash_invite_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        let t1 = generate_invite_token();
        let t2 = generate_invite_token();
        assert_ne!(t1, t2);
        assert!(t1.len() >= 40, "32 bytes base64url should exceed 40 chars");
    }

    #[test]
    fn hash_is_stable_and_hex() {
        let raw = "some-raw-token";
        let h1 = hash_invite_token(raw);
        let h2 = hash_invite_token(raw);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

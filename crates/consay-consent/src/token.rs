//! Approval-token and public-slug generation.
//!
//! Approval tokens are opaque bearer secrets: 32 random bytes,
//! base64url-encoded without padding. Slugs are short lowercase
//! alphanumeric identifiers for public record URLs; collisions are
//! possible and handled by the caller's retry loop.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};

/// Alphabet for public slugs. Lowercase alphanumeric only, so slugs
/// stay readable when shared by hand.
const SLUG_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generate a cryptographically random approval token
/// (32 bytes of entropy, base64url-encoded, no padding).
pub fn generate_approval_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a random slug of `length` lowercase alphanumeric
/// characters.
pub fn generate_slug(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx: usize = rand::Rng::random_range(&mut rng, 0..SLUG_ALPHABET.len());
            SLUG_ALPHABET[idx] as char
        })
        .collect()
}

/// Expiry timestamp for an approval token, `days` from now.
pub fn token_expiry(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

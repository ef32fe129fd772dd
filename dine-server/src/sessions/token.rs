//! Session token generation and comparison

use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use shared::models::SessionToken;

/// Token entropy in bytes (hex-encoded to 64 chars)
const TOKEN_BYTES: usize = 32;

/// Fresh token from the OS RNG
pub fn generate() -> SessionToken {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    SessionToken::new(hex::encode(bytes))
}

/// Compare a presented token against the stored one.
///
/// Both sides are hashed first so the comparison time does not depend on
/// how many leading characters match.
pub fn matches(presented: &str, stored: &SessionToken) -> bool {
    if presented.is_empty() || stored.as_str().is_empty() {
        return false;
    }
    let a = Sha256::digest(presented.as_bytes());
    let b = Sha256::digest(stored.as_str().as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

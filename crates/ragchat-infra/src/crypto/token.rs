//! Bearer tokens and SHA-256 digests.
//!
//! Tokens are 32 bytes from the OS CSPRNG, hex-encoded behind an `rc_`
//! prefix. Only the SHA-256 digest is persisted.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use ragchat_core::auth::hasher::TokenMinter;
use sha2::{Digest, Sha256};

const TOKEN_PREFIX: &str = "rc_";

/// `TokenMinter` backed by `OsRng` and SHA-256.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenMinter;

impl TokenMinter for RandomTokenMinter {
    fn mint(&self) -> String {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        format!("{TOKEN_PREFIX}{}", hex_encode(&bytes))
    }

    fn digest(&self, token: &str) -> String {
        sha256_hex(token)
    }
}

/// Lowercase hex SHA-256 of `content`.
pub fn sha256_hex(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

//! Credential hashing ports.
//!
//! Defined in ragchat-core so the auth service can hash passwords and
//! mint tokens without coupling to a specific algorithm. The Argon2 and
//! SHA-256 adapters live in ragchat-infra.

use ragchat_types::error::AuthError;

/// Slow, salted password hashing.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing (PHC) hash of `password`.
    fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// Check `password` against a stored hash. Malformed hashes never verify.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Opaque bearer-token generation.
///
/// Tokens are high-entropy random strings, so a fast unsalted digest is
/// enough for lookup; only the digest is stored.
pub trait TokenMinter: Send + Sync {
    /// A fresh random token.
    fn mint(&self) -> String;

    /// Hex digest used as the storage key for `token`.
    fn digest(&self, token: &str) -> String;
}

//! Cryptographic operations for ragchat.
//!
//! - `password`: Argon2id password hashing
//! - `token`: random bearer tokens and their SHA-256 lookup digests

pub mod password;
pub mod token;

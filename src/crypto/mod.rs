//! Cryptographic primitives for VaultKeep.
//!
//! This module provides:
//! - Argon2id passphrase-based key derivation (`kdf`)
//! - XChaCha20-Poly1305 encryption and decryption (`cipher`)

pub mod cipher;
pub mod kdf;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use cipher::{decrypt, encrypt, Nonce, Sealed, NONCE_LEN, TAG_LEN};
pub use kdf::{derive_key, Argon2Params, DerivedKey, Salt, KEY_LEN, SALT_LEN};

//! VaultKeep: a local vault sealed with Argon2id and XChaCha20-Poly1305.
//!
//! The core lives in [`crypto`] (key derivation and the AEAD cipher) and
//! [`vault`] (record format, storage backends and the lifecycle state
//! machine).  [`cli`] is a thin synchronous front end over it.

#[cfg(feature = "audit-log")]
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod vault;

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in VaultKeep.
#[derive(Debug, Error)]
pub enum VaultKeepError {
    // --- Crypto errors ---
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Authentication failed — wrong passphrase or tampered vault")]
    Authentication,

    #[error("Invalid nonce length: expected {expected} bytes, got {actual}")]
    InvalidNonce { expected: usize, actual: usize },

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // --- Vault errors ---
    #[error("Corrupt vault record: {0}")]
    CorruptRecord(String),

    #[error("No vault found in {0}")]
    VaultNotFound(String),

    #[error("A vault already exists in {0}")]
    VaultAlreadyExists(String),

    #[error("Vault is {actual}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Entry '{0}' not found")]
    EntryNotFound(String),

    #[error("Invalid entry name: {0}")]
    InvalidEntryName(String),

    // --- Storage errors ---
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Keyring error: {0}")]
    Keyring(String),

    #[error("Failed to move vault aside to {0}")]
    QuarantineFailed(PathBuf),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    Config(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    Serialization(String),

    // --- Runtime errors ---
    #[error("Vault worker stopped before completing the operation")]
    WorkerFailed,

    #[error("Audit error: {0}")]
    Audit(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl VaultKeepError {
    /// Returns `true` for failures a collaborator should only ever see as
    /// "unlock failed".
    ///
    /// Wrong passphrases, tampered records, malformed records and rejected
    /// KDF inputs all collapse into this one signal at the shell boundary.
    pub fn is_unlock_failure(&self) -> bool {
        matches!(
            self,
            Self::Authentication
                | Self::CorruptRecord(_)
                | Self::KeyDerivation(_)
                | Self::InvalidNonce { .. }
        )
    }
}

/// Convenience type alias for VaultKeep results.
pub type Result<T> = std::result::Result<T, VaultKeepError>;

//! Structured plaintext stored inside a vault.
//!
//! The store itself treats the payload as opaque bytes; this is the
//! format the CLI (and most embedders) put there: a JSON document of
//! named entries with creation/update timestamps.  A freshly initialized
//! vault holds an empty `VaultContents`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{Result, VaultKeepError};

/// Version of the contents document.
const CONTENTS_VERSION: u32 = 1;

/// A single named value stored in the vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Drop for Entry {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

/// Lightweight metadata about an entry (no value).
#[derive(Debug, Clone)]
pub struct EntryMetadata {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Decrypted vault contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultContents {
    pub version: u32,
    #[serde(default)]
    entries: BTreeMap<String, Entry>,
}

impl Default for VaultContents {
    fn default() -> Self {
        Self {
            version: CONTENTS_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl VaultContents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse decrypted vault bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let contents: Self = serde_json::from_slice(bytes)
            .map_err(|e| VaultKeepError::Serialization(format!("vault contents: {e}")))?;

        if contents.version != CONTENTS_VERSION {
            return Err(VaultKeepError::Serialization(format!(
                "unsupported contents version {}, expected {CONTENTS_VERSION}",
                contents.version
            )));
        }
        Ok(contents)
    }

    /// Serialize for sealing.  The buffer is wiped when dropped.
    pub fn to_bytes(&self) -> Result<Zeroizing<Vec<u8>>> {
        serde_json::to_vec(self)
            .map(Zeroizing::new)
            .map_err(|e| VaultKeepError::Serialization(format!("vault contents: {e}")))
    }

    /// Add or update an entry, preserving `created_at` on update.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        validate_entry_name(name)?;

        let now = Utc::now();
        let created_at = self
            .entries
            .get(name)
            .map_or(now, |existing| existing.created_at);

        self.entries.insert(
            name.to_string(),
            Entry {
                value: value.to_string(),
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&str> {
        self.entries
            .get(name)
            .map(|e| e.value.as_str())
            .ok_or_else(|| VaultKeepError::EntryNotFound(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        if self.entries.remove(name).is_none() {
            return Err(VaultKeepError::EntryNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Metadata for all entries, sorted by name.
    pub fn list(&self) -> Vec<EntryMetadata> {
        self.entries
            .iter()
            .map(|(name, e)| EntryMetadata {
                name: name.clone(),
                created_at: e.created_at,
                updated_at: e.updated_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allowed: ASCII letters, digits, underscores, hyphens, periods.
/// Must be non-empty and at most 256 characters.
fn validate_entry_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(VaultKeepError::InvalidEntryName(
            "entry name cannot be empty".into(),
        ));
    }
    if name.len() > 256 {
        return Err(VaultKeepError::InvalidEntryName(
            "entry name cannot exceed 256 characters".into(),
        ));
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.')
    {
        return Err(VaultKeepError::InvalidEntryName(format!(
            "'{name}' contains invalid characters — only ASCII letters, digits, underscores, hyphens, and periods are allowed"
        )));
    }
    Ok(())
}

//! Pluggable persistence for vault records.
//!
//! `RecordStorage` is the capability interface the store depends on:
//! put the opaque record bytes somewhere, get them back.  Backends:
//!
//! - `FileStorage`: a single file, replaced atomically on every write.
//! - `MemoryStorage`: process memory, for embedders and tests.
//! - `KeyringStorage` (feature `keyring-store`): the OS credential store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::errors::{Result, VaultKeepError};

/// Where a vault record lives.
pub trait RecordStorage: Send {
    /// Persist the record bytes, replacing any previous record.
    fn store(&mut self, bytes: &[u8]) -> Result<()>;

    /// Load the record bytes, or `None` if no vault exists yet.
    fn retrieve(&self) -> Result<Option<Vec<u8>>>;

    /// Move the current record out of the way so a new vault can be
    /// created.  Returns where it went, if the backend keeps it.
    fn quarantine(&mut self) -> Result<Option<PathBuf>>;

    /// Human-readable location, used in messages and logs.
    fn describe(&self) -> String;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// A record stored in one file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let parent = self.path.parent().unwrap_or(Path::new("."));
        parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ))
    }
}

impl RecordStorage for FileStorage {
    /// Write to a temp file in the same directory, then rename over the
    /// target so readers never see a half-written record.
    fn store(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        // A leftover temp file would keep its old mode.
        match fs::remove_file(&tmp_path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path)?;
        debug!(path = %self.path.display(), len = bytes.len(), "Vault record written");
        Ok(())
    }

    fn retrieve(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename the record to `<name>.mismatch_<unix-seconds>`.
    fn quarantine(&mut self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let file_name = self.path.file_name().unwrap_or_default().to_string_lossy();
        let target = self.path.with_file_name(format!("{file_name}.mismatch_{ts}"));

        fs::rename(&self.path, &target).map_err(|e| {
            warn!(error = %e, "Failed to quarantine vault record");
            VaultKeepError::QuarantineFailed(target.clone())
        })?;
        Ok(Some(target))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// An in-memory record slot.
///
/// Clones share the same slot, so a test can keep a handle and inspect
/// or tamper with what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slot: Arc<Mutex<Option<Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the stored bytes directly.
    pub fn replace(&self, bytes: Option<Vec<u8>>) -> Result<()> {
        *self.lock()? = bytes;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<Vec<u8>>>> {
        self.slot
            .lock()
            .map_err(|_| VaultKeepError::Storage("memory slot poisoned".into()))
    }
}

impl RecordStorage for MemoryStorage {
    fn store(&mut self, bytes: &[u8]) -> Result<()> {
        *self.lock()? = Some(bytes.to_vec());
        Ok(())
    }

    fn retrieve(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.clone())
    }

    fn quarantine(&mut self) -> Result<Option<PathBuf>> {
        self.lock()?.take();
        Ok(None)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ---------------------------------------------------------------------------
// KeyringStorage
// ---------------------------------------------------------------------------

#[cfg(feature = "keyring-store")]
pub use keyring_backend::KeyringStorage;

#[cfg(feature = "keyring-store")]
mod keyring_backend {
    //! Stores the record in the OS credential store:
    //! - macOS: Keychain
    //! - Windows: Credential Manager
    //! - Linux: Secret Service (GNOME Keyring / KDE Wallet)
    //!
    //! Records are binary, so they are base64-encoded into the password
    //! field of the entry.

    use std::path::PathBuf;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;

    use super::RecordStorage;
    use crate::errors::{Result, VaultKeepError};

    /// Service name used in the OS keyring.
    const SERVICE_NAME: &str = "vaultkeep";

    pub struct KeyringStorage {
        account: String,
    }

    impl KeyringStorage {
        /// `vault_id` distinguishes vaults sharing one keyring.
        pub fn new(vault_id: &str) -> Self {
            Self {
                account: format!("vault:{vault_id}"),
            }
        }

        fn entry(&self) -> Result<keyring::Entry> {
            keyring::Entry::new(SERVICE_NAME, &self.account).map_err(|e| {
                VaultKeepError::Keyring(format!("failed to create keyring entry: {e}"))
            })
        }
    }

    impl RecordStorage for KeyringStorage {
        fn store(&mut self, bytes: &[u8]) -> Result<()> {
            self.entry()?
                .set_password(&BASE64.encode(bytes))
                .map_err(|e| VaultKeepError::Keyring(format!("failed to store record: {e}")))
        }

        fn retrieve(&self) -> Result<Option<Vec<u8>>> {
            match self.entry()?.get_password() {
                Ok(encoded) => BASE64
                    .decode(encoded)
                    .map(Some)
                    .map_err(|e| VaultKeepError::CorruptRecord(format!("keyring entry: {e}"))),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(VaultKeepError::Keyring(format!(
                    "failed to read from keyring: {e}"
                ))),
            }
        }

        fn quarantine(&mut self) -> Result<Option<PathBuf>> {
            match self.entry()?.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(VaultKeepError::Keyring(format!(
                    "failed to delete from keyring: {e}"
                ))),
            }
        }

        fn describe(&self) -> String {
            format!("keyring:{}", self.account)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_roundtrip_creates_parent() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested/vault.bin"));

        assert!(storage.retrieve().unwrap().is_none());
        storage.store(b"record").unwrap();
        assert_eq!(storage.retrieve().unwrap().as_deref(), Some(&b"record"[..]));
        assert!(!storage.tmp_path().exists(), "temp file must be renamed away");
    }

    #[test]
    fn file_storage_overwrites() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("vault.bin"));
        storage.store(b"one").unwrap();
        storage.store(b"two").unwrap();
        assert_eq!(storage.retrieve().unwrap().as_deref(), Some(&b"two"[..]));
    }

    #[test]
    fn file_storage_quarantine_renames_record() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("vault.bin"));
        storage.store(b"old").unwrap();

        let moved = storage.quarantine().unwrap().unwrap();
        assert!(moved
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("vault.bin.mismatch_"));
        assert_eq!(fs::read(&moved).unwrap(), b"old");
        assert!(storage.retrieve().unwrap().is_none());
    }

    #[test]
    fn file_storage_quarantine_without_record_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("vault.bin"));
        assert!(storage.quarantine().unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_sets_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("vault.bin"));
        storage.store(b"record").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn file_storage_replaces_stale_temp_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("vault.bin"));
        let stale = storage.tmp_path();
        fs::write(&stale, b"stale").unwrap();
        fs::set_permissions(&stale, fs::Permissions::from_mode(0o644)).unwrap();

        storage.store(b"record").unwrap();

        let mode = fs::metadata(storage.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(fs::read(storage.path()).unwrap(), b"record");
        assert!(!stale.exists());
    }

    #[test]
    fn memory_storage_clones_share_slot() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.store(b"shared").unwrap();
        assert_eq!(b.retrieve().unwrap().as_deref(), Some(&b"shared"[..]));

        a.quarantine().unwrap();
        assert!(b.retrieve().unwrap().is_none());
    }
}

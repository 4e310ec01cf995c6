//! The vault lifecycle: initialize, unlock, update, rotate, lock.
//!
//! `VaultStore` owns the storage backend and the session.  While the
//! vault is unlocked the session holds the single in-memory copy of the
//! derived key; every path back to `Locked` drops it, which zeroes it.
//!
//! ```text
//! Locked --unlock--> Unlocking --ok--> Unlocked --lock--> Locked
//!                        |
//!                        +--error--> Failed --reported--> Locked
//! ```

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::crypto::kdf::{self, Argon2Params, DerivedKey, Salt};
use crate::errors::{Result, VaultKeepError};

use super::contents::VaultContents;
use super::record::VaultRecord;
use super::storage::RecordStorage;

/// How far a stored record's KDF cost may exceed what this store would
/// use itself (or the default, whichever is higher).
const MAX_COST_FACTOR: u64 = 4;

/// Externally visible vault state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Locked,
    Unlocking,
    Unlocked,
    Failed,
}

impl VaultState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocking => "unlocking",
            Self::Unlocked => "unlocked",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VaultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Callback invoked on every state transition.
pub type TransitionObserver = Box<dyn Fn(VaultState) + Send>;

struct UnlockedSession {
    key: DerivedKey,
    record: VaultRecord,
}

enum Session {
    Locked,
    Unlocking,
    Unlocked(UnlockedSession),
    Failed,
}

impl Session {
    fn state(&self) -> VaultState {
        match self {
            Self::Locked => VaultState::Locked,
            Self::Unlocking => VaultState::Unlocking,
            Self::Unlocked(_) => VaultState::Unlocked,
            Self::Failed => VaultState::Failed,
        }
    }
}

/// The main vault handle.
pub struct VaultStore {
    storage: Box<dyn RecordStorage>,

    /// Argon2 params used when sealing under a new salt.
    params: Argon2Params,

    /// Device binding mixed into the associated data of every record.
    binding: Vec<u8>,

    session: Session,

    observer: Option<TransitionObserver>,
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a locked store over `storage` with default Argon2 params
    /// and no device binding.
    pub fn new(storage: impl RecordStorage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            params: Argon2Params::default(),
            binding: Vec::new(),
            session: Session::Locked,
            observer: None,
        }
    }

    /// Argon2 params for newly created salts (initialize and rotate).
    /// Existing records always re-open with their stored params.
    pub fn with_params(mut self, params: Argon2Params) -> Self {
        self.params = params;
        self
    }

    /// Tie records to a device identifier.  A record sealed with one
    /// binding fails authentication under any other.
    pub fn with_binding(mut self, binding: impl Into<Vec<u8>>) -> Self {
        self.binding = binding.into();
        self
    }

    pub fn with_observer(mut self, observer: impl Fn(VaultState) + Send + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Create a new vault holding an empty `VaultContents`.
    pub fn initialize(&mut self, passphrase: &[u8]) -> Result<VaultRecord> {
        let payload = VaultContents::new().to_bytes()?;
        self.initialize_with(passphrase, &payload)
    }

    /// Create a new vault holding `payload`.
    ///
    /// Generates a salt, derives the key, seals and persists the record.
    /// The key is dropped before returning; the store stays locked.
    pub fn initialize_with(&mut self, passphrase: &[u8], payload: &[u8]) -> Result<VaultRecord> {
        if self.storage.retrieve()?.is_some() {
            return Err(VaultKeepError::VaultAlreadyExists(self.storage.describe()));
        }
        self.lock();

        let salt = Salt::generate();
        let key = kdf::derive_key(passphrase, &salt, &self.params)?;
        let record = VaultRecord::seal(payload, &key, salt, self.params, &self.binding)?;
        drop(key);

        self.persist(&record)?;
        info!(location = %self.storage.describe(), "Vault initialized");
        Ok(record)
    }

    /// Derive the key from the stored salt and decrypt the vault.
    ///
    /// On success the store is unlocked and keeps the key until `lock`.
    /// On failure the store passes through `Failed` back to `Locked` and
    /// no key material is retained.
    pub fn unlock(&mut self, passphrase: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if !matches!(self.session, Session::Locked) {
            return Err(invalid_state("locked", &self.session));
        }
        self.transition(Session::Unlocking);

        match self.open_stored(passphrase) {
            Ok((key, record, plaintext)) => {
                self.transition(Session::Unlocked(UnlockedSession { key, record }));
                info!(location = %self.storage.describe(), "Vault unlocked");
                Ok(plaintext)
            }
            Err(e) => {
                self.transition(Session::Failed);
                warn!(location = %self.storage.describe(), error = %e, "Unlock failed");
                self.transition(Session::Locked);
                Err(e)
            }
        }
    }

    /// Re-encrypt `plaintext` under the session key with a fresh nonce.
    ///
    /// Salt, params and format version stay as they are.
    pub fn update(&mut self, plaintext: &[u8]) -> Result<VaultRecord> {
        let record = match &self.session {
            Session::Unlocked(s) => s.record.reseal(plaintext, &s.key, &self.binding)?,
            other => return Err(invalid_state("unlocked", other)),
        };

        self.persist(&record)?;
        if let Session::Unlocked(s) = &mut self.session {
            s.record = record.clone();
        }
        debug!(len = plaintext.len(), "Vault contents updated");
        Ok(record)
    }

    /// Replace the passphrase.
    ///
    /// Opens the stored record with `old`, then re-seals the same
    /// plaintext under a new salt and a key derived from `new`.  An
    /// unlocked session switches to the new key.
    pub fn rotate_passphrase(&mut self, old: &[u8], new: &[u8]) -> Result<VaultRecord> {
        if matches!(self.session, Session::Unlocking) {
            return Err(invalid_state("locked or unlocked", &self.session));
        }

        let (old_key, _, plaintext) = self.open_stored(old)?;
        drop(old_key);

        let salt = Salt::generate();
        let new_key = kdf::derive_key(new, &salt, &self.params)?;
        let rotated = VaultRecord::seal(&plaintext, &new_key, salt, self.params, &self.binding)?;

        self.persist(&rotated)?;
        if let Session::Unlocked(s) = &mut self.session {
            s.key = new_key;
            s.record = rotated.clone();
        }

        info!(location = %self.storage.describe(), "Vault passphrase rotated");
        Ok(rotated)
    }

    /// Drop the session key.  No-op when already locked.
    pub fn lock(&mut self) {
        if matches!(self.session, Session::Unlocked(_)) {
            self.transition(Session::Locked);
            info!(location = %self.storage.describe(), "Vault locked");
        }
    }

    /// Lock and move the stored record aside so a new vault can be
    /// initialized.  Returns where the old record went, if anywhere.
    pub fn reset(&mut self) -> Result<Option<PathBuf>> {
        self.lock();
        let moved = self.storage.quarantine()?;
        warn!(
            location = %self.storage.describe(),
            moved_to = ?moved,
            "Vault reset"
        );
        Ok(moved)
    }

    // ------------------------------------------------------------------
    // Structured contents
    // ------------------------------------------------------------------

    /// `unlock`, then parse the plaintext as `VaultContents`.
    ///
    /// Re-locks if the plaintext is not a contents document.
    pub fn unlock_contents(&mut self, passphrase: &[u8]) -> Result<VaultContents> {
        let plaintext = self.unlock(passphrase)?;
        VaultContents::from_bytes(&plaintext).inspect_err(|_| self.lock())
    }

    /// Serialize `contents` and `update` the vault with it.
    pub fn save_contents(&mut self, contents: &VaultContents) -> Result<VaultRecord> {
        let bytes = contents.to_bytes()?;
        self.update(&bytes)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn state(&self) -> VaultState {
        self.session.state()
    }

    /// Returns `true` if a record exists in storage.
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.storage.retrieve()?.is_some())
    }

    /// Load and parse the stored record without decrypting it.
    pub fn load_record(&self) -> Result<VaultRecord> {
        let bytes = self
            .storage
            .retrieve()?
            .ok_or_else(|| VaultKeepError::VaultNotFound(self.storage.describe()))?;
        VaultRecord::from_bytes(&bytes)
    }

    pub fn location(&self) -> String {
        self.storage.describe()
    }

    pub fn params(&self) -> Argon2Params {
        self.params
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn open_stored(
        &self,
        passphrase: &[u8],
    ) -> Result<(DerivedKey, VaultRecord, Zeroizing<Vec<u8>>)> {
        let record = self.load_record()?;
        self.check_cost(&record)?;
        let key = record.derive_key(passphrase)?;
        let plaintext = record.open(&key, &self.binding)?;
        Ok((key, record, plaintext))
    }

    /// The header params are unauthenticated until after derivation, so a
    /// forged header must not be able to demand arbitrary work.
    fn check_cost(&self, record: &VaultRecord) -> Result<()> {
        let budget = self
            .params
            .cost()
            .max(Argon2Params::default().cost())
            .saturating_mul(MAX_COST_FACTOR);
        if record.params.cost() > budget {
            warn!(
                stored = record.params.cost(),
                budget, "Stored Argon2 cost exceeds budget"
            );
            return Err(VaultKeepError::CorruptRecord(format!(
                "stored Argon2 cost {} exceeds the accepted {budget}",
                record.params.cost()
            )));
        }
        Ok(())
    }

    fn persist(&mut self, record: &VaultRecord) -> Result<()> {
        let bytes = record.to_bytes()?;
        self.storage.store(&bytes)
    }

    fn transition(&mut self, next: Session) {
        let state = next.state();
        self.session = next;
        if let Some(observer) = &self.observer {
            observer(state);
        }
    }
}

fn invalid_state(expected: &'static str, actual: &Session) -> VaultKeepError {
    VaultKeepError::InvalidState {
        expected,
        actual: actual.state().as_str(),
    }
}

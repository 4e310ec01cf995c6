//! Async access to a `VaultStore` for UI-facing callers.
//!
//! Key derivation is deliberately slow, so every operation runs on
//! tokio's blocking pool while the caller's future suspends.  All
//! operations on one vault go through a single async mutex, which keeps
//! two unlock attempts from ever running at the same time.
//!
//! Dropping a pending future is safe: the worker still finishes, notices
//! nobody is waiting for the result, and locks the vault again if that
//! operation is what unlocked it, so no key stays behind for a caller
//! that gave up.

use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::debug;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultKeepError};

use super::record::VaultRecord;
use super::store::{VaultState, VaultStore};

/// Cloneable handle to one vault.
#[derive(Clone)]
pub struct VaultHandle {
    inner: Arc<Mutex<VaultStore>>,
}

impl VaultHandle {
    pub fn new(store: VaultStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    pub async fn initialize(&self, passphrase: Zeroizing<String>) -> Result<VaultRecord> {
        self.run_blocking("initialize", move |store| {
            store.initialize(passphrase.as_bytes())
        })
        .await
    }

    pub async fn unlock(&self, passphrase: Zeroizing<String>) -> Result<Zeroizing<Vec<u8>>> {
        self.run_blocking("unlock", move |store| store.unlock(passphrase.as_bytes()))
            .await
    }

    pub async fn update(&self, plaintext: Zeroizing<Vec<u8>>) -> Result<VaultRecord> {
        self.run_blocking("update", move |store| store.update(&plaintext))
            .await
    }

    pub async fn rotate_passphrase(
        &self,
        old: Zeroizing<String>,
        new: Zeroizing<String>,
    ) -> Result<VaultRecord> {
        self.run_blocking("rotate_passphrase", move |store| {
            store.rotate_passphrase(old.as_bytes(), new.as_bytes())
        })
        .await
    }

    pub async fn lock(&self) {
        self.inner.lock().await.lock();
    }

    /// Current state; waits for any in-flight operation to finish.
    pub async fn state(&self) -> VaultState {
        self.inner.lock().await.state()
    }

    pub async fn reset(&self) -> Result<Option<std::path::PathBuf>> {
        self.run_blocking("reset", VaultStore::reset).await
    }

    /// Take the vault mutex, run `op` on the blocking pool, and hand the
    /// result back through a oneshot channel.
    async fn run_blocking<T, F>(&self, name: &'static str, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut VaultStore) -> Result<T> + Send + 'static,
    {
        let mut store = Arc::clone(&self.inner).lock_owned().await;
        let (tx, rx) = oneshot::channel();

        tokio::task::spawn_blocking(move || {
            let was_unlocked = store.state() == VaultState::Unlocked;
            let outcome = op(&mut store);
            // Undo only an unlock nobody is waiting for; a session some
            // other caller opened stays open.
            let opened_here = !was_unlocked && store.state() == VaultState::Unlocked;
            if tx.send(outcome).is_err() && opened_here {
                debug!(operation = name, "Caller cancelled; locking vault");
                store.lock();
            }
        });

        rx.await.map_err(|_| VaultKeepError::WorkerFailed)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kdf::Argon2Params;
    use crate::vault::storage::MemoryStorage;

    fn handle() -> VaultHandle {
        let params = Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        };
        VaultHandle::new(VaultStore::new(MemoryStorage::new()).with_params(params))
    }

    fn pw(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    #[tokio::test]
    async fn unlock_and_lock_through_handle() {
        let h = handle();
        h.initialize(pw("correct-horse")).await.unwrap();

        h.unlock(pw("correct-horse")).await.unwrap();
        assert_eq!(h.state().await, VaultState::Unlocked);

        h.lock().await;
        assert_eq!(h.state().await, VaultState::Locked);
    }

    #[tokio::test]
    async fn concurrent_unlocks_are_serialized() {
        let h = handle();
        h.initialize(pw("correct-horse")).await.unwrap();

        let (a, b) = tokio::join!(
            h.unlock(pw("correct-horse")),
            h.unlock(pw("correct-horse"))
        );

        // Exactly one attempt wins; the other finds the vault already open.
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(VaultKeepError::InvalidState { .. }))));
    }

    #[tokio::test]
    async fn cancelled_unlock_leaves_vault_locked() {
        let h = handle();
        h.initialize(pw("correct-horse")).await.unwrap();

        {
            let pending = h.unlock(pw("correct-horse"));
            tokio::pin!(pending);
            tokio::select! {
                biased;
                _ = &mut pending => panic!("unlock should still be deriving"),
                () = std::future::ready(()) => {}
            }
        }

        assert_eq!(h.state().await, VaultState::Locked);
        // The record is untouched and still opens.
        h.unlock(pw("correct-horse")).await.unwrap();
    }

    #[tokio::test]
    async fn cancelled_unlock_keeps_existing_session() {
        let h = handle();
        h.initialize(pw("correct-horse")).await.unwrap();
        h.unlock(pw("correct-horse")).await.unwrap();

        {
            let pending = h.unlock(pw("correct-horse"));
            tokio::pin!(pending);
            tokio::select! {
                biased;
                _ = &mut pending => panic!("unlock should still be queued on the worker"),
                () = std::future::ready(()) => {}
            }
        }

        assert_eq!(h.state().await, VaultState::Unlocked);
        h.update(Zeroizing::new(b"still writable".to_vec())).await.unwrap();
    }
}

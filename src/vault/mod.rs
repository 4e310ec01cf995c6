//! Vault module — the encrypted-at-rest container.
//!
//! This module provides:
//! - The binary `VaultRecord` format (`record`)
//! - Pluggable record persistence (`storage`)
//! - The lifecycle state machine `VaultStore` (`store`)
//! - An async, serialized `VaultHandle` for UI-facing callers (`handle`)
//! - The structured plaintext document `VaultContents` (`contents`)

pub mod contents;
pub mod handle;
pub mod record;
pub mod storage;
pub mod store;

// Re-export the most commonly used items.
pub use contents::{EntryMetadata, VaultContents};
pub use handle::VaultHandle;
pub use record::VaultRecord;
pub use storage::{FileStorage, MemoryStorage, RecordStorage};
pub use store::{VaultState, VaultStore};

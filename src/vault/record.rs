//! Binary vault record format.
//!
//! A stored record has this layout:
//!
//! ```text
//! [VKPR: 4][version: 1][memory_kib: 4 LE][iterations: 4 LE][parallelism: 4 LE]
//! [salt: 32][nonce: 24][ciphertext_len: 4 LE][ciphertext][tag: 16]
//! ```
//!
//! - **Magic** (`VKPR`): identifies the blob as a VaultKeep record.
//! - **Version**: format version (currently `1`), reserved for migrations.
//! - **Argon2 params**: the KDF settings the vault was sealed with.
//! - **Salt**, **nonce**: fixed-size for version 1.
//! - **Ciphertext length**: little-endian u32, so truncation is detected
//!   structurally before any decryption is attempted.
//! - **Tag**: the detached Poly1305 tag.
//!
//! The associated data bound into the tag is the header prefix (magic
//! through salt) followed by a SHA-256 digest of the device binding, so
//! editing the params or salt, or opening the record on another device,
//! fails authentication.

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::crypto::cipher::{self, Nonce, NONCE_LEN, TAG_LEN};
use crate::crypto::kdf::{self, Argon2Params, DerivedKey, Salt, SALT_LEN};
use crate::errors::{Result, VaultKeepError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every record.
const MAGIC: &[u8; 4] = b"VKPR";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Magic + version + three u32 params.
const PARAMS_END: usize = 4 + 1 + 12;

/// Everything covered by the associated data: prefix through salt.
const AAD_PREFIX_LEN: usize = PARAMS_END + SALT_LEN;

/// Fixed-size portion before the ciphertext.
const HEADER_LEN: usize = AAD_PREFIX_LEN + NONCE_LEN + 4;

// ---------------------------------------------------------------------------
// VaultRecord
// ---------------------------------------------------------------------------

/// The persisted, encrypted form of a vault.
#[derive(Debug, Clone)]
pub struct VaultRecord {
    pub format_version: u8,
    pub params: Argon2Params,
    pub salt: Salt,
    pub nonce: Nonce,
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

impl VaultRecord {
    /// Encrypt `plaintext` under `key` into a new record.
    ///
    /// `salt` and `params` must be the ones `key` was derived with; they
    /// are stored so the same key can be re-derived on unlock.
    pub fn seal(
        plaintext: &[u8],
        key: &DerivedKey,
        salt: Salt,
        params: Argon2Params,
        binding: &[u8],
    ) -> Result<Self> {
        let aad = associated_data(CURRENT_VERSION, &params, &salt, binding);
        let sealed = cipher::encrypt(plaintext, key, &aad)?;

        Ok(Self {
            format_version: CURRENT_VERSION,
            params,
            salt,
            nonce: sealed.nonce,
            ciphertext: sealed.ciphertext,
            tag: sealed.tag,
        })
    }

    /// Re-encrypt new contents with a fresh nonce under the same key.
    ///
    /// Salt, params and version are carried over unchanged.
    pub fn reseal(&self, plaintext: &[u8], key: &DerivedKey, binding: &[u8]) -> Result<Self> {
        Self::seal(plaintext, key, self.salt, self.params, binding)
    }

    /// Derive the key for this record from `passphrase`.
    pub fn derive_key(&self, passphrase: &[u8]) -> Result<DerivedKey> {
        kdf::derive_key(passphrase, &self.salt, &self.params)
    }

    /// Verify and decrypt this record with an already-derived key.
    pub fn open(&self, key: &DerivedKey, binding: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let aad = associated_data(self.format_version, &self.params, &self.salt, binding);
        cipher::decrypt(
            &self.ciphertext,
            self.nonce.as_bytes(),
            &self.tag,
            key,
            &aad,
        )
    }

    /// Serialize to the binary layout described in the module docs.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let ct_len = u32::try_from(self.ciphertext.len()).map_err(|_| {
            VaultKeepError::Serialization(format!(
                "ciphertext length {} exceeds u32::MAX",
                self.ciphertext.len()
            ))
        })?;

        let mut buf = Vec::with_capacity(HEADER_LEN + self.ciphertext.len() + TAG_LEN);
        write_prefix(&mut buf, self.format_version, &self.params, &self.salt);
        buf.extend_from_slice(self.nonce.as_bytes()); // 24 bytes
        buf.extend_from_slice(&ct_len.to_le_bytes()); // 4 bytes LE
        buf.extend_from_slice(&self.ciphertext);
        buf.extend_from_slice(&self.tag); // 16 bytes
        Ok(buf)
    }

    /// Parse a stored record.
    ///
    /// Only structure is checked here; authenticity is established by
    /// `open`.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN + TAG_LEN {
            return Err(corrupt("record too small"));
        }

        if &data[0..4] != MAGIC {
            return Err(corrupt("missing VKPR magic bytes"));
        }

        let format_version = data[4];
        if format_version != CURRENT_VERSION {
            return Err(corrupt(format!(
                "unsupported version {format_version}, expected {CURRENT_VERSION}"
            )));
        }

        let params = Argon2Params {
            memory_kib: read_u32(data, 5)?,
            iterations: read_u32(data, 9)?,
            parallelism: read_u32(data, 13)?,
        };
        // Reject out-of-range costs here, before anyone runs the KDF on them.
        params
            .validate()
            .map_err(|e| corrupt(format!("stored params rejected: {e}")))?;

        let salt = Salt::from_slice(&data[PARAMS_END..AAD_PREFIX_LEN])
            .map_err(|_| corrupt("bad salt"))?;
        let nonce_end = AAD_PREFIX_LEN + NONCE_LEN;
        let nonce = Nonce::from_slice(&data[AAD_PREFIX_LEN..nonce_end])
            .map_err(|_| corrupt("bad nonce"))?;

        let ct_len = usize::try_from(read_u32(data, nonce_end)?)
            .map_err(|_| corrupt("ciphertext length exceeds platform address space"))?;

        let expected = HEADER_LEN
            .checked_add(ct_len)
            .and_then(|n| n.checked_add(TAG_LEN))
            .ok_or_else(|| corrupt("ciphertext length overflow"))?;
        if data.len() != expected {
            return Err(corrupt(format!(
                "length mismatch: header declares {expected} bytes, found {}",
                data.len()
            )));
        }

        let ct_end = HEADER_LEN + ct_len;
        let mut tag = [0u8; TAG_LEN];
        tag.copy_from_slice(&data[ct_end..]);

        Ok(Self {
            format_version,
            params,
            salt,
            nonce,
            ciphertext: data[HEADER_LEN..ct_end].to_vec(),
            tag,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_prefix(buf: &mut Vec<u8>, version: u8, params: &Argon2Params, salt: &Salt) {
    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(version); // 1 byte
    buf.extend_from_slice(&params.memory_kib.to_le_bytes());
    buf.extend_from_slice(&params.iterations.to_le_bytes());
    buf.extend_from_slice(&params.parallelism.to_le_bytes());
    buf.extend_from_slice(salt.as_bytes()); // 32 bytes
}

/// Build the associated data: header prefix || SHA-256(binding).
fn associated_data(version: u8, params: &Argon2Params, salt: &Salt, binding: &[u8]) -> Vec<u8> {
    let mut aad = Vec::with_capacity(AAD_PREFIX_LEN + 32);
    write_prefix(&mut aad, version, params, salt);
    aad.extend_from_slice(&Sha256::digest(binding));
    aad
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let bytes: [u8; 4] = data
        .get(offset..offset + 4)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| corrupt("truncated header field"))?;
    Ok(u32::from_le_bytes(bytes))
}

fn corrupt(msg: impl Into<String>) -> VaultKeepError {
    VaultKeepError::CorruptRecord(msg.into())
}

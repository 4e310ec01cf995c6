//! XChaCha20-Poly1305 authenticated encryption with a detached tag.
//!
//! Each call to `encrypt` generates a fresh random 24-byte nonce.  The
//! extended nonce is large enough that random generation carries no
//! practical collision risk under a single key.
//!
//! The nonce, ciphertext and 16-byte Poly1305 tag are returned as
//! separate fields so the record format can lay them out explicitly.

use std::fmt;

use chacha20poly1305::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use chacha20poly1305::{Key, Tag, XChaCha20Poly1305, XNonce};
use zeroize::{Zeroize, Zeroizing};

use super::kdf::DerivedKey;
use crate::errors::{Result, VaultKeepError};

/// Size of the XChaCha20 nonce in bytes.
pub const NONCE_LEN: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// A 24-byte XChaCha20 nonce.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nonce([u8; NONCE_LEN]);

impl Nonce {
    /// Generate a fresh random nonce.
    pub fn generate() -> Self {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let mut bytes = [0u8; NONCE_LEN];
        bytes.copy_from_slice(&nonce);
        Self(bytes)
    }

    /// Build a nonce from stored bytes, rejecting any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; NONCE_LEN] =
            bytes
                .try_into()
                .map_err(|_| VaultKeepError::InvalidNonce {
                    expected: NONCE_LEN,
                    actual: bytes.len(),
                })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }
}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nonce(")?;
        for b in &self.0[..4] {
            write!(f, "{b:02x}")?;
        }
        write!(f, "..)")
    }
}

/// Output of a single `encrypt` call.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub nonce: Nonce,
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

fn cipher_for(key: &DerivedKey) -> XChaCha20Poly1305 {
    XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Encrypt and authenticate `plaintext` together with `associated_data`.
pub fn encrypt(plaintext: &[u8], key: &DerivedKey, associated_data: &[u8]) -> Result<Sealed> {
    let cipher = cipher_for(key);
    let nonce = Nonce::generate();

    let mut buffer = plaintext.to_vec();
    let tag = match cipher.encrypt_in_place_detached(
        XNonce::from_slice(nonce.as_bytes()),
        associated_data,
        &mut buffer,
    ) {
        Ok(tag) => tag,
        Err(e) => {
            buffer.zeroize();
            return Err(VaultKeepError::EncryptionFailed(format!(
                "XChaCha20-Poly1305 error: {e}"
            )));
        }
    };

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(&tag);

    Ok(Sealed {
        nonce,
        ciphertext: buffer,
        tag: tag_bytes,
    })
}

/// Verify the tag and decrypt.
///
/// Nothing is returned unless the tag verifies over ciphertext and
/// associated data; the working buffer is wiped on failure.
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8],
    tag: &[u8],
    key: &DerivedKey,
    associated_data: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let nonce = Nonce::from_slice(nonce)?;
    if tag.len() != TAG_LEN {
        return Err(VaultKeepError::Authentication);
    }

    let cipher = cipher_for(key);
    let mut buffer = Zeroizing::new(ciphertext.to_vec());

    cipher
        .decrypt_in_place_detached(
            XNonce::from_slice(nonce.as_bytes()),
            associated_data,
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| VaultKeepError::Authentication)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::new([byte; 32])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let k = key(0x11);
        let sealed = encrypt(b"vault payload", &k, b"header").unwrap();
        let plain = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &sealed.tag, &k, b"header").unwrap();
        assert_eq!(plain.as_slice(), b"vault payload");
    }

    #[test]
    fn empty_plaintext_roundtrip() {
        let k = key(0x12);
        let sealed = encrypt(b"", &k, b"").unwrap();
        assert!(sealed.ciphertext.is_empty());
        let plain = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &sealed.tag, &k, b"").unwrap();
        assert!(plain.is_empty());
    }

    #[test]
    fn ciphertext_length_matches_plaintext() {
        let k = key(0x13);
        let sealed = encrypt(b"twelve bytes", &k, b"").unwrap();
        assert_eq!(sealed.ciphertext.len(), 12);
    }

    #[test]
    fn every_bit_flip_fails_authentication() {
        let k = key(0x22);
        let sealed = encrypt(b"abc", &k, b"ad").unwrap();

        for i in 0..sealed.ciphertext.len() * 8 {
            let mut ct = sealed.ciphertext.clone();
            ct[i / 8] ^= 1 << (i % 8);
            let err = decrypt(&ct, sealed.nonce.as_bytes(), &sealed.tag, &k, b"ad").unwrap_err();
            assert!(matches!(err, VaultKeepError::Authentication));
        }

        for i in 0..TAG_LEN * 8 {
            let mut tag = sealed.tag;
            tag[i / 8] ^= 1 << (i % 8);
            let err = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &tag, &k, b"ad").unwrap_err();
            assert!(matches!(err, VaultKeepError::Authentication));
        }
    }

    #[test]
    fn wrong_associated_data_fails() {
        let k = key(0x33);
        let sealed = encrypt(b"abc", &k, b"device-a").unwrap();
        let err = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &sealed.tag, &k, b"device-b").unwrap_err();
        assert!(matches!(err, VaultKeepError::Authentication));
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = encrypt(b"abc", &key(0x01), b"").unwrap();
        let err = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &sealed.tag, &key(0x02), b"").unwrap_err();
        assert!(matches!(err, VaultKeepError::Authentication));
    }

    #[test]
    fn short_nonce_is_rejected() {
        let k = key(0x44);
        let sealed = encrypt(b"abc", &k, b"").unwrap();
        let err = decrypt(&sealed.ciphertext, &[0u8; 12], &sealed.tag, &k, b"").unwrap_err();
        assert!(matches!(
            err,
            VaultKeepError::InvalidNonce {
                expected: NONCE_LEN,
                actual: 12
            }
        ));
    }

    #[test]
    fn short_tag_fails_authentication() {
        let k = key(0x55);
        let sealed = encrypt(b"abc", &k, b"").unwrap();
        let err = decrypt(&sealed.ciphertext, sealed.nonce.as_bytes(), &sealed.tag[..8], &k, b"").unwrap_err();
        assert!(matches!(err, VaultKeepError::Authentication));
    }

    #[test]
    fn nonces_do_not_repeat() {
        let k = key(0x66);
        let mut seen = HashSet::with_capacity(10_000);
        for _ in 0..10_000 {
            let sealed = encrypt(b"x", &k, b"").unwrap();
            assert!(seen.insert(sealed.nonce), "nonce repeated");
        }
    }
}

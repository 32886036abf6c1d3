//! Supported AEAD ciphers and the name lookup table.

use aes_gcm::{Aes128Gcm, Aes256Gcm};
use chacha20poly1305::aead::{Aead, KeyInit, Nonce};
use chacha20poly1305::XChaCha20Poly1305;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::CryptError;

/// Authenticated cipher used for an envelope
///
/// The envelope does not record which cipher produced it, so producer and
/// consumer must agree on the algorithm out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    /// XChaCha20-Poly1305: 24-byte nonce, 32-byte key
    #[default]
    XChaCha20Poly1305,
    /// AES-256 in GCM mode: 12-byte nonce, 32-byte key
    Aes256Gcm,
    /// AES-128 in GCM mode: 12-byte nonce, 16-byte key
    Aes128Gcm,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Algorithm; 3] = [
        Algorithm::XChaCha20Poly1305,
        Algorithm::Aes256Gcm,
        Algorithm::Aes128Gcm,
    ];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => "xchacha20-poly1305",
            Self::Aes256Gcm => "aes-256-gcm",
            Self::Aes128Gcm => "aes-128-gcm",
        }
    }

    /// Nonce length in bytes
    pub fn nonce_len(&self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => 24,
            Self::Aes256Gcm | Self::Aes128Gcm => 12,
        }
    }

    /// Key length in bytes
    pub fn key_len(&self) -> usize {
        match self {
            Self::XChaCha20Poly1305 | Self::Aes256Gcm => 32,
            Self::Aes128Gcm => 16,
        }
    }

    /// Encrypt and authenticate `plaintext`
    ///
    /// `key` and `nonce` must already have this algorithm's lengths.
    pub(crate) fn seal(
        &self,
        key: &[u8],
        nonce: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>, CryptError> {
        match self {
            Self::XChaCha20Poly1305 => seal_with::<XChaCha20Poly1305>(*self, key, nonce, plaintext),
            Self::Aes256Gcm => seal_with::<Aes256Gcm>(*self, key, nonce, plaintext),
            Self::Aes128Gcm => seal_with::<Aes128Gcm>(*self, key, nonce, plaintext),
        }
    }

    /// Verify and decrypt `ciphertext`
    pub(crate) fn open(
        &self,
        key: &[u8],
        nonce: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, CryptError> {
        match self {
            Self::XChaCha20Poly1305 => open_with::<XChaCha20Poly1305>(*self, key, nonce, ciphertext),
            Self::Aes256Gcm => open_with::<Aes256Gcm>(*self, key, nonce, ciphertext),
            Self::Aes128Gcm => open_with::<Aes128Gcm>(*self, key, nonce, ciphertext),
        }
    }
}

fn cipher<C: KeyInit>(algorithm: Algorithm, key: &[u8]) -> Result<C, CryptError> {
    C::new_from_slice(key).map_err(|_| CryptError::InvalidKeyLength {
        algorithm: algorithm.name(),
        expected: algorithm.key_len(),
        actual: key.len(),
    })
}

fn seal_with<C: KeyInit + Aead>(
    algorithm: Algorithm,
    key: &[u8],
    nonce: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CryptError> {
    cipher::<C>(algorithm, key)?
        .encrypt(Nonce::<C>::from_slice(nonce), plaintext)
        .map_err(|_| CryptError::EncryptionFailed)
}

fn open_with<C: KeyInit + Aead>(
    algorithm: Algorithm,
    key: &[u8],
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptError> {
    cipher::<C>(algorithm, key)?
        .decrypt(Nonce::<C>::from_slice(nonce), ciphertext)
        .map_err(|_| CryptError::DecryptionFailed)
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CipherTable::global()
            .lookup(s)
            .ok_or_else(|| CryptError::UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for Algorithm {
    type Error = CryptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(algorithm: Algorithm) -> Self {
        algorithm.name().to_string()
    }
}

// ============================================================================
// Cipher table
// ============================================================================

/// Read-only name to algorithm table, built once per process
#[derive(Debug)]
pub struct CipherTable {
    entries: HashMap<&'static str, Algorithm>,
}

impl CipherTable {
    /// The shared table
    pub fn global() -> &'static CipherTable {
        static TABLE: OnceLock<CipherTable> = OnceLock::new();
        TABLE.get_or_init(|| CipherTable {
            entries: Algorithm::ALL
                .iter()
                .map(|algorithm| (algorithm.name(), *algorithm))
                .collect(),
        })
    }

    /// Find an algorithm by name, ignoring case
    pub fn lookup(&self, name: &str) -> Option<Algorithm> {
        self.entries
            .get(name.trim().to_ascii_lowercase().as_str())
            .copied()
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "algorithm_tests.rs"]
mod tests;

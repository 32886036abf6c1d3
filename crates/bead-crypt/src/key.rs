//! Encryption key holder.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::rand_core::RngCore;
use chacha20poly1305::aead::OsRng;
use std::fmt;
use zeroize::Zeroizing;

use crate::algorithm::Algorithm;
use crate::error::CryptError;

/// Symmetric key bound to one algorithm
///
/// Not `Clone`; the bytes are wiped exactly once, when the key is dropped.
pub struct EncryptionKey {
    algorithm: Algorithm,
    bytes: Zeroizing<Vec<u8>>,
}

impl EncryptionKey {
    /// Take ownership of raw key bytes
    ///
    /// # Errors
    ///
    /// Returns [`CryptError::InvalidKeyLength`] if `bytes` does not match the
    /// algorithm's key length.
    pub fn new(algorithm: Algorithm, bytes: Vec<u8>) -> Result<Self, CryptError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() != algorithm.key_len() {
            return Err(CryptError::InvalidKeyLength {
                algorithm: algorithm.name(),
                expected: algorithm.key_len(),
                actual: bytes.len(),
            });
        }

        Ok(Self { algorithm, bytes })
    }

    /// Decode a base64 (standard alphabet) key
    pub fn from_base64(algorithm: Algorithm, encoded: &str) -> Result<Self, CryptError> {
        let bytes = STANDARD.decode(encoded.trim())?;
        Self::new(algorithm, bytes)
    }

    /// Generate a fresh random key
    pub fn generate(algorithm: Algorithm) -> Result<Self, CryptError> {
        let mut bytes = Zeroizing::new(vec![0u8; algorithm.key_len()]);
        fill_random(&mut bytes)?;
        Ok(Self { algorithm, bytes })
    }

    /// Get algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Encode the key as base64 for storage in configuration
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes.as_slice()))
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("algorithm", &self.algorithm)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Fill `buf` from the operating system's CSPRNG
pub(crate) fn fill_random(buf: &mut [u8]) -> Result<(), CryptError> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| CryptError::RandomSource(e.to_string()))
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;

//! Wire format of encrypted values.
//!
//! ```text
//! base64( nonce || flag || ciphertext )
//! ```
//!
//! The nonce length is fixed by the algorithm. The flag is one ASCII byte:
//! `Y` when the plaintext was serialised before encryption, `N` when it was
//! a raw string or byte buffer.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CryptError;

/// Flag byte marking a serialised plaintext
pub const FLAG_SERIALISED: u8 = b'Y';

/// Flag byte marking a raw plaintext
pub const FLAG_RAW: u8 = b'N';

/// Decoded parts of an encrypted value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: Vec<u8>,
    pub serialised: bool,
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Concatenate and base64-encode the parts
    pub fn encode(&self) -> String {
        let mut buffer = Vec::with_capacity(self.nonce.len() + 1 + self.ciphertext.len());
        buffer.extend_from_slice(&self.nonce);
        buffer.push(if self.serialised {
            FLAG_SERIALISED
        } else {
            FLAG_RAW
        });
        buffer.extend_from_slice(&self.ciphertext);

        STANDARD.encode(buffer)
    }

    /// Split an encoded envelope using the algorithm's nonce length
    ///
    /// # Errors
    ///
    /// - [`CryptError::InvalidEncoding`] if `encoded` is not base64
    /// - [`CryptError::Truncated`] if fewer than `nonce_len + 1` bytes decode
    /// - [`CryptError::InvalidFlag`] if the flag is neither `Y` nor `N`
    pub fn decode(encoded: &str, nonce_len: usize) -> Result<Self, CryptError> {
        let mut buffer = STANDARD.decode(encoded.trim())?;

        let minimum = nonce_len + 1;
        if buffer.len() < minimum {
            return Err(CryptError::Truncated {
                minimum,
                actual: buffer.len(),
            });
        }

        let serialised = match buffer[nonce_len] {
            FLAG_SERIALISED => true,
            FLAG_RAW => false,
            other => return Err(CryptError::InvalidFlag(other)),
        };

        let ciphertext = buffer.split_off(minimum);
        buffer.truncate(nonce_len);

        Ok(Self {
            nonce: buffer,
            serialised,
            ciphertext,
        })
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

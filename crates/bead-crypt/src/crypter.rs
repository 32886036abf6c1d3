//! Encrypting and decrypting values into envelopes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::algorithm::Algorithm;
use crate::envelope::Envelope;
use crate::error::CryptError;
use crate::key::{fill_random, EncryptionKey};

// ============================================================================
// Plaintext and modes
// ============================================================================

/// Whether plaintext is serialised before encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SerializationMode {
    /// Strings and byte buffers go in raw, anything else is serialised
    #[default]
    Auto,
    /// Always serialise; byte buffers are refused
    On,
    /// Never serialise; only strings and byte buffers are accepted
    Off,
}

impl FromStr for SerializationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(format!(
                "unknown serialisation mode '{}', expected auto, on or off",
                other
            )),
        }
    }
}

impl fmt::Display for SerializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::On => "on",
            Self::Off => "off",
        })
    }
}

/// A value to encrypt, or the result of decrypting one
///
/// Decrypting a raw envelope yields `Text` when the bytes are UTF-8 and
/// `Binary` otherwise, so `Binary` input that happens to be valid UTF-8
/// comes back as `Text` with the same bytes. A serialised envelope always
/// yields `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Plaintext {
    Text(String),
    Binary(Vec<u8>),
    Value(Value),
}

impl Plaintext {
    /// Bytes to encrypt without serialisation, when the value is string-like
    fn raw_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(text) => Some(text.as_bytes()),
            Self::Binary(bytes) => Some(bytes),
            Self::Value(Value::String(text)) => Some(text.as_bytes()),
            Self::Value(_) => None,
        }
    }

    fn to_json(&self) -> Result<Vec<u8>, CryptError> {
        match self {
            Self::Text(text) => serde_json::to_vec(text).map_err(CryptError::Serialise),
            Self::Binary(_) => Err(CryptError::BinarySerialisation),
            Self::Value(value) => serde_json::to_vec(value).map_err(CryptError::Serialise),
        }
    }
}

impl From<String> for Plaintext {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Plaintext {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Plaintext {
    fn from(value: Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

impl From<&[u8]> for Plaintext {
    fn from(value: &[u8]) -> Self {
        Self::Binary(value.to_vec())
    }
}

impl From<Value> for Plaintext {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Produces encrypted envelopes
pub trait Encrypt {
    fn encrypt(&self, data: Plaintext, mode: SerializationMode) -> Result<String, CryptError>;
}

/// Opens encrypted envelopes
pub trait Decrypt {
    fn decrypt(&self, encoded: &str) -> Result<Plaintext, CryptError>;
}

// ============================================================================
// Crypter
// ============================================================================

/// Encrypts and decrypts envelopes with one key
///
/// A fresh nonce is drawn from the OS random source for every encryption.
#[derive(Debug)]
pub struct Crypter {
    key: EncryptionKey,
}

impl Crypter {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Get algorithm
    pub fn algorithm(&self) -> Algorithm {
        self.key.algorithm()
    }

    /// Serialise and encrypt any value
    pub fn encrypt_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CryptError> {
        let json = serde_json::to_vec(value).map_err(CryptError::Serialise)?;
        self.seal(&json, true)
    }

    /// Decrypt an envelope into a typed value
    ///
    /// A raw envelope is read as a JSON string, so `String` targets work for
    /// values encrypted without serialisation.
    pub fn decrypt_value<T: DeserializeOwned>(&self, encoded: &str) -> Result<T, CryptError> {
        let (plaintext, serialised) = self.open(encoded)?;

        if serialised {
            return serde_json::from_slice(&plaintext).map_err(CryptError::Unserialise);
        }

        let text = String::from_utf8(plaintext).map_err(|e| {
            CryptError::Unserialise(serde::de::Error::custom(format!(
                "raw plaintext is not UTF-8: {}",
                e
            )))
        })?;
        serde_json::from_value(Value::String(text)).map_err(CryptError::Unserialise)
    }

    fn seal(&self, plaintext: &[u8], serialised: bool) -> Result<String, CryptError> {
        let algorithm = self.key.algorithm();
        let mut nonce = vec![0u8; algorithm.nonce_len()];
        fill_random(&mut nonce)?;

        let ciphertext = algorithm.seal(self.key.expose(), &nonce, plaintext)?;
        debug!(
            algorithm = algorithm.name(),
            serialised,
            plaintext_bytes = plaintext.len(),
            "Encrypted value"
        );

        Ok(Envelope {
            nonce,
            serialised,
            ciphertext,
        }
        .encode())
    }

    fn open(&self, encoded: &str) -> Result<(Vec<u8>, bool), CryptError> {
        let algorithm = self.key.algorithm();
        let envelope = Envelope::decode(encoded, algorithm.nonce_len())?;

        let plaintext = algorithm
            .open(self.key.expose(), &envelope.nonce, &envelope.ciphertext)
            .map_err(|e| {
                warn!(algorithm = algorithm.name(), "Envelope failed authentication");
                e
            })?;

        Ok((plaintext, envelope.serialised))
    }
}

impl Encrypt for Crypter {
    fn encrypt(&self, data: Plaintext, mode: SerializationMode) -> Result<String, CryptError> {
        match (mode, data.raw_bytes()) {
            (SerializationMode::On, _) => self.seal(&data.to_json()?, true),
            (SerializationMode::Auto, Some(raw)) | (SerializationMode::Off, Some(raw)) => {
                self.seal(raw, false)
            }
            (SerializationMode::Auto, None) => self.seal(&data.to_json()?, true),
            (SerializationMode::Off, None) => Err(CryptError::SerialisationRequired),
        }
    }
}

impl Decrypt for Crypter {
    fn decrypt(&self, encoded: &str) -> Result<Plaintext, CryptError> {
        let (plaintext, serialised) = self.open(encoded)?;

        if serialised {
            let value = serde_json::from_slice(&plaintext).map_err(CryptError::Unserialise)?;
            return Ok(Plaintext::Value(value));
        }

        Ok(match String::from_utf8(plaintext) {
            Ok(text) => Plaintext::Text(text),
            Err(e) => Plaintext::Binary(e.into_bytes()),
        })
    }
}

#[cfg(test)]
#[path = "crypter_tests.rs"]
mod tests;

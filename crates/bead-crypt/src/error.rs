//! Error types for encryption and decryption.

use thiserror::Error;

/// Errors from key handling, envelope decoding and AEAD operations
#[derive(Debug, Error)]
pub enum CryptError {
    #[error("Invalid key length for {algorithm}: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown cipher '{name}'")]
    UnknownAlgorithm { name: String },

    #[error("Random source failed: {0}")]
    RandomSource(String),

    #[error("Serialisation must be enabled to encrypt non-string values")]
    SerialisationRequired,

    #[error("Binary plaintext cannot be serialised; encrypt it raw")]
    BinarySerialisation,

    #[error("Failed to serialise plaintext: {0}")]
    Serialise(#[source] serde_json::Error),

    #[error("Envelope is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("Envelope too short: need at least {minimum} bytes, got {actual}")]
    Truncated { minimum: usize, actual: usize },

    #[error("Invalid serialisation flag 0x{0:02x}")]
    InvalidFlag(u8),

    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Decryption failed: ciphertext or key is invalid")]
    DecryptionFailed,

    #[error("Failed to unserialise plaintext: {0}")]
    Unserialise(#[source] serde_json::Error),
}

impl CryptError {
    /// Check if the error means the envelope was tampered with or mangled
    pub fn is_corrupt_envelope(&self) -> bool {
        matches!(
            self,
            Self::InvalidEncoding(_)
                | Self::Truncated { .. }
                | Self::InvalidFlag(_)
                | Self::DecryptionFailed
        )
    }
}

//! Crypt section of the configuration file.

use serde::Deserialize;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::Algorithm;
use crate::crypter::Crypter;
use crate::error::CryptError;
use crate::key::EncryptionKey;

/// Algorithm and base64 key used to build a [`Crypter`]
///
/// ```toml
/// [crypt]
/// algorithm = "xchacha20-poly1305"
/// key = "base64 key bytes"
/// ```
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CryptConfig {
    #[serde(default)]
    #[zeroize(skip)]
    pub algorithm: Algorithm,
    pub key: String,
}

impl CryptConfig {
    /// Decode the key and create a crypter
    pub fn build(&self) -> Result<Crypter, CryptError> {
        let key = EncryptionKey::from_base64(self.algorithm, &self.key)?;
        Ok(Crypter::new(key))
    }
}

impl fmt::Debug for CryptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptConfig")
            .field("algorithm", &self.algorithm)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

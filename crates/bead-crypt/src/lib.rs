//! # Bead Crypt
//!
//! Authenticated encryption of strings and serialisable values into
//! self-describing base64 envelopes.
//!
//! ## Envelope
//!
//! ```text
//! base64( nonce || flag || ciphertext )
//! ```
//!
//! - `nonce` - fresh random bytes per encryption, length fixed by the algorithm
//! - `flag` - `Y` if the plaintext was JSON-serialised, `N` if it was raw
//! - `ciphertext` - AEAD output including the authentication tag
//!
//! ## Module Organization
//!
//! - [`algorithm`] - Supported ciphers and the [`CipherTable`]
//! - [`key`] - [`EncryptionKey`], wiped on drop
//! - [`envelope`] - Wire format encode/decode
//! - [`crypter`] - [`Crypter`] and the [`Encrypt`]/[`Decrypt`] traits
//! - [`config`] - [`CryptConfig`] for building a crypter from configuration
//! - [`error`] - [`CryptError`]
//!
//! ## Example
//!
//! ```
//! use bead_crypt::{Algorithm, Crypter, Decrypt, Encrypt, EncryptionKey, Plaintext, SerializationMode};
//!
//! let crypter = Crypter::new(EncryptionKey::generate(Algorithm::XChaCha20Poly1305).unwrap());
//! let envelope = crypter.encrypt("hello".into(), SerializationMode::Auto).unwrap();
//! assert_eq!(crypter.decrypt(&envelope).unwrap(), Plaintext::Text("hello".into()));
//! ```

pub mod algorithm;
pub mod config;
pub mod crypter;
pub mod envelope;
pub mod error;
pub mod key;

pub use algorithm::{Algorithm, CipherTable};
pub use config::CryptConfig;
pub use crypter::{Crypter, Decrypt, Encrypt, Plaintext, SerializationMode};
pub use envelope::Envelope;
pub use error::CryptError;
pub use key::EncryptionKey;

//! Tests for the encryption key holder.

use super::*;

#[test]
fn test_wrong_length_fails_at_construction() {
    let result = EncryptionKey::new(Algorithm::XChaCha20Poly1305, vec![0u8; 16]);

    match result {
        Err(CryptError::InvalidKeyLength {
            algorithm,
            expected,
            actual,
        }) => {
            assert_eq!(algorithm, "xchacha20-poly1305");
            assert_eq!(expected, 32);
            assert_eq!(actual, 16);
        }
        other => panic!("expected InvalidKeyLength, got {:?}", other),
    }

    assert!(EncryptionKey::new(Algorithm::Aes128Gcm, vec![0u8; 16]).is_ok());
}

#[test]
fn test_generate_uses_algorithm_length() {
    for algorithm in Algorithm::ALL {
        let key = EncryptionKey::generate(algorithm).unwrap();
        assert_eq!(key.expose().len(), algorithm.key_len());
        assert_eq!(key.algorithm(), algorithm);
    }
}

#[test]
fn test_generated_keys_differ() {
    let a = EncryptionKey::generate(Algorithm::Aes256Gcm).unwrap();
    let b = EncryptionKey::generate(Algorithm::Aes256Gcm).unwrap();

    assert_ne!(a.expose(), b.expose());
}

#[test]
fn test_base64_round_trip() {
    let key = EncryptionKey::generate(Algorithm::XChaCha20Poly1305).unwrap();
    let encoded = key.to_base64();

    let decoded = EncryptionKey::from_base64(Algorithm::XChaCha20Poly1305, &encoded).unwrap();
    assert_eq!(decoded.expose(), key.expose());
}

#[test]
fn test_from_base64_rejects_garbage() {
    assert!(matches!(
        EncryptionKey::from_base64(Algorithm::Aes256Gcm, "not base64!"),
        Err(CryptError::InvalidEncoding(_))
    ));

    // Valid base64, wrong length
    assert!(matches!(
        EncryptionKey::from_base64(Algorithm::Aes256Gcm, "AAAA"),
        Err(CryptError::InvalidKeyLength { .. })
    ));
}

#[test]
fn test_debug_is_redacted() {
    let key = EncryptionKey::new(Algorithm::Aes128Gcm, vec![0x41; 16]).unwrap();
    let rendered = format!("{:?}", key);

    assert!(rendered.contains("REDACTED"));
    assert!(!rendered.contains("65"));
}

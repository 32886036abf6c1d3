//! Tests for envelope encryption and decryption.

use super::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;

fn crypter(algorithm: Algorithm) -> Crypter {
    Crypter::new(EncryptionKey::generate(algorithm).unwrap())
}

fn flag_of(encoded: &str, algorithm: Algorithm) -> u8 {
    STANDARD.decode(encoded).unwrap()[algorithm.nonce_len()]
}

// ============================================================================
// Round trips
// ============================================================================

mod round_trip_tests {
    use super::*;

    #[test]
    fn test_string_round_trip_each_algorithm() {
        for algorithm in Algorithm::ALL {
            let crypter = crypter(algorithm);
            let encoded = crypter
                .encrypt("hello".into(), SerializationMode::Auto)
                .unwrap();

            assert_eq!(flag_of(&encoded, algorithm), b'N');
            assert_eq!(
                crypter.decrypt(&encoded).unwrap(),
                Plaintext::Text("hello".to_string())
            );
        }
    }

    #[test]
    fn test_non_string_round_trip() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);
        let value = json!({"user": 42, "roles": ["admin", "ops"]});

        let encoded = crypter
            .encrypt(value.clone().into(), SerializationMode::Auto)
            .unwrap();

        assert_eq!(flag_of(&encoded, Algorithm::XChaCha20Poly1305), b'Y');
        assert_eq!(crypter.decrypt(&encoded).unwrap(), Plaintext::Value(value));
    }

    #[test]
    fn test_false_round_trips() {
        let crypter = crypter(Algorithm::Aes256Gcm);

        let encoded = crypter
            .encrypt(Value::Bool(false).into(), SerializationMode::Auto)
            .unwrap();

        assert_eq!(
            crypter.decrypt(&encoded).unwrap(),
            Plaintext::Value(Value::Bool(false))
        );
    }

    #[test]
    fn test_binary_round_trip() {
        let crypter = crypter(Algorithm::Aes128Gcm);
        let bytes = vec![0xff, 0x00, 0xfe];

        let encoded = crypter
            .encrypt(bytes.clone().into(), SerializationMode::Off)
            .unwrap();

        assert_eq!(crypter.decrypt(&encoded).unwrap(), Plaintext::Binary(bytes));
    }

    #[test]
    fn test_utf8_binary_decrypts_as_text() {
        let crypter = crypter(Algorithm::Aes128Gcm);

        let encoded = crypter
            .encrypt(b"plain".to_vec().into(), SerializationMode::Auto)
            .unwrap();

        assert_eq!(
            crypter.decrypt(&encoded).unwrap(),
            Plaintext::Text("plain".to_string())
        );
    }

    #[test]
    fn test_binary_is_refused_when_serialising() {
        let crypter = crypter(Algorithm::Aes128Gcm);

        let result = crypter.encrypt(vec![0xff, 0x00, 0xfe].into(), SerializationMode::On);

        assert!(matches!(result, Err(CryptError::BinarySerialisation)));
    }

    #[test]
    fn test_empty_string_round_trip() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);

        let encoded = crypter.encrypt("".into(), SerializationMode::Off).unwrap();

        assert_eq!(
            crypter.decrypt(&encoded).unwrap(),
            Plaintext::Text(String::new())
        );
    }

    #[test]
    fn test_encryptions_differ_but_decrypt_equal() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);

        let first = crypter.encrypt("same".into(), SerializationMode::Auto).unwrap();
        let second = crypter.encrypt("same".into(), SerializationMode::Auto).unwrap();

        assert_ne!(first, second);
        assert_eq!(
            crypter.decrypt(&first).unwrap(),
            crypter.decrypt(&second).unwrap()
        );
    }
}

// ============================================================================
// Serialisation modes
// ============================================================================

mod mode_tests {
    use super::*;

    #[test]
    fn test_on_serialises_strings() {
        let crypter = crypter(Algorithm::Aes256Gcm);

        let encoded = crypter.encrypt("text".into(), SerializationMode::On).unwrap();

        assert_eq!(flag_of(&encoded, Algorithm::Aes256Gcm), b'Y');
        assert_eq!(
            crypter.decrypt(&encoded).unwrap(),
            Plaintext::Value(json!("text"))
        );
    }

    #[test]
    fn test_off_rejects_non_strings() {
        let crypter = crypter(Algorithm::Aes256Gcm);

        let result = crypter.encrypt(json!([1, 2]).into(), SerializationMode::Off);

        assert!(matches!(result, Err(CryptError::SerialisationRequired)));
    }

    #[test]
    fn test_string_values_count_as_strings() {
        let crypter = crypter(Algorithm::Aes256Gcm);

        let encoded = crypter
            .encrypt(json!("plain").into(), SerializationMode::Off)
            .unwrap();

        assert_eq!(flag_of(&encoded, Algorithm::Aes256Gcm), b'N');
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("AUTO".parse::<SerializationMode>().unwrap(), SerializationMode::Auto);
        assert_eq!("on".parse::<SerializationMode>().unwrap(), SerializationMode::On);
        assert_eq!("off".parse::<SerializationMode>().unwrap(), SerializationMode::Off);
        assert!("maybe".parse::<SerializationMode>().is_err());
        assert_eq!(SerializationMode::default().to_string(), "auto");
    }
}

// ============================================================================
// Failures
// ============================================================================

mod failure_tests {
    use super::*;

    #[test]
    fn test_flipped_ciphertext_bit_fails() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);
        let encoded = crypter.encrypt("secret".into(), SerializationMode::Auto).unwrap();

        let mut raw = STANDARD.decode(&encoded).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        let tampered = STANDARD.encode(raw);

        let error = crypter.decrypt(&tampered).unwrap_err();
        assert!(matches!(error, CryptError::DecryptionFailed));
        assert!(error.is_corrupt_envelope());
    }

    #[test]
    fn test_corrupted_flag_is_rejected() {
        let crypter = crypter(Algorithm::Aes256Gcm);
        let encoded = crypter.encrypt("secret".into(), SerializationMode::Auto).unwrap();

        let mut raw = STANDARD.decode(&encoded).unwrap();
        raw[Algorithm::Aes256Gcm.nonce_len()] = b'Z';

        assert!(matches!(
            crypter.decrypt(&STANDARD.encode(raw)),
            Err(CryptError::InvalidFlag(b'Z'))
        ));
    }

    #[test]
    fn test_short_buffer_is_truncated() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);
        let short = STANDARD.encode([0u8; 24]);

        assert!(matches!(
            crypter.decrypt(&short),
            Err(CryptError::Truncated { minimum: 25, .. })
        ));
    }

    #[test]
    fn test_bad_base64_is_invalid_encoding() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);

        assert!(matches!(
            crypter.decrypt("%%%"),
            Err(CryptError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let encoded = crypter(Algorithm::Aes256Gcm)
            .encrypt("secret".into(), SerializationMode::Auto)
            .unwrap();

        assert!(matches!(
            crypter(Algorithm::Aes256Gcm).decrypt(&encoded),
            Err(CryptError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_serialised_garbage_fails_to_unserialise() {
        let crypter = crypter(Algorithm::Aes256Gcm);
        let encoded = crypter.seal(b"{not json", true).unwrap();

        assert!(matches!(
            crypter.decrypt(&encoded),
            Err(CryptError::Unserialise(_))
        ));
    }
}

// ============================================================================
// Typed helpers
// ============================================================================

mod typed_tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: u64,
        admin: bool,
    }

    #[test]
    fn test_typed_round_trip() {
        let crypter = crypter(Algorithm::XChaCha20Poly1305);
        let session = Session {
            user_id: 7,
            admin: false,
        };

        let encoded = crypter.encrypt_value(&session).unwrap();
        let decoded: Session = crypter.decrypt_value(&encoded).unwrap();

        assert_eq!(decoded, session);
    }

    #[test]
    fn test_typed_false() {
        let crypter = crypter(Algorithm::Aes256Gcm);

        let encoded = crypter.encrypt_value(&false).unwrap();

        assert!(!crypter.decrypt_value::<bool>(&encoded).unwrap());
    }

    #[test]
    fn test_typed_string_from_raw_envelope() {
        let crypter = crypter(Algorithm::Aes256Gcm);
        let encoded = crypter.encrypt("raw".into(), SerializationMode::Off).unwrap();

        let decoded: String = crypter.decrypt_value(&encoded).unwrap();

        assert_eq!(decoded, "raw");
    }

    #[test]
    fn test_typed_mismatch_is_unserialise_error() {
        let crypter = crypter(Algorithm::Aes256Gcm);
        let encoded = crypter.encrypt_value(&"text").unwrap();

        assert!(matches!(
            crypter.decrypt_value::<u64>(&encoded),
            Err(CryptError::Unserialise(_))
        ));
    }
}

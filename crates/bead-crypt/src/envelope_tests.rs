//! Tests for the envelope wire format.

use super::*;

#[test]
fn test_layout() {
    let envelope = Envelope {
        nonce: vec![1, 2, 3],
        serialised: true,
        ciphertext: vec![9, 9],
    };

    let raw = STANDARD.decode(envelope.encode()).unwrap();
    assert_eq!(raw, vec![1, 2, 3, b'Y', 9, 9]);

    let raw_flag = Envelope {
        serialised: false,
        ..envelope
    };
    assert_eq!(STANDARD.decode(raw_flag.encode()).unwrap()[3], b'N');
}

#[test]
fn test_decode_splits_parts() {
    let encoded = STANDARD.encode([1u8, 2, 3, b'N', 7, 8, 9]);

    let envelope = Envelope::decode(&encoded, 3).unwrap();

    assert_eq!(envelope.nonce, vec![1, 2, 3]);
    assert!(!envelope.serialised);
    assert_eq!(envelope.ciphertext, vec![7, 8, 9]);
}

#[test]
fn test_decode_allows_empty_ciphertext() {
    let encoded = STANDARD.encode([0u8, 0, b'Y']);

    let envelope = Envelope::decode(&encoded, 2).unwrap();

    assert!(envelope.serialised);
    assert!(envelope.ciphertext.is_empty());
}

#[test]
fn test_decode_rejects_short_buffer() {
    let encoded = STANDARD.encode([0u8; 24]);

    match Envelope::decode(&encoded, 24) {
        Err(CryptError::Truncated { minimum, actual }) => {
            assert_eq!(minimum, 25);
            assert_eq!(actual, 24);
        }
        other => panic!("expected Truncated, got {:?}", other),
    }
}

#[test]
fn test_decode_rejects_bad_flag() {
    let encoded = STANDARD.encode([0u8, 0, b'X', 1]);

    assert!(matches!(
        Envelope::decode(&encoded, 2),
        Err(CryptError::InvalidFlag(b'X'))
    ));
}

#[test]
fn test_decode_rejects_bad_base64() {
    assert!(matches!(
        Envelope::decode("***", 12),
        Err(CryptError::InvalidEncoding(_))
    ));
}

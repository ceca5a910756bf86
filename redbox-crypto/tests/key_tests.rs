use pretty_assertions::assert_eq;
use redbox_crypto::{derive_key, CryptoError, KdfParams, Salt, KEY_SIZE, SALT_SIZE};

#[test]
fn derivation_is_deterministic() {
    let salt = Salt::from_bytes([9u8; SALT_SIZE]);
    let a = derive_key("correct-horse", &salt, &KdfParams::fast_insecure()).unwrap();
    let b = derive_key("correct-horse", &salt, &KdfParams::fast_insecure()).unwrap();
    assert_eq!(a.as_bytes(), b.as_bytes());
    assert_eq!(a.as_bytes().len(), KEY_SIZE);
}

#[test]
fn salt_changes_key() {
    let a = derive_key("pw", &Salt::from_bytes([1u8; SALT_SIZE]), &KdfParams::fast_insecure())
        .unwrap();
    let b = derive_key("pw", &Salt::from_bytes([2u8; SALT_SIZE]), &KdfParams::fast_insecure())
        .unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn iteration_count_changes_key() {
    let salt = Salt::from_bytes([3u8; SALT_SIZE]);
    let a = derive_key("pw", &salt, &KdfParams { iterations: 1_000 }).unwrap();
    let b = derive_key("pw", &salt, &KdfParams { iterations: 1_001 }).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn passphrase_changes_key() {
    let salt = Salt::from_bytes(*b"0123456789abcdef");
    let a = derive_key("correct-horse", &salt, &KdfParams::fast_insecure()).unwrap();
    let b = derive_key("correct-horsf", &salt, &KdfParams::fast_insecure()).unwrap();
    assert_ne!(a.as_bytes(), b.as_bytes());
}

#[test]
fn empty_passphrase_rejected() {
    let err = derive_key("", &Salt::random().unwrap(), &KdfParams::default()).unwrap_err();
    assert!(matches!(err, CryptoError::KeyDerivation(_)));
}

#[test]
fn zero_iterations_rejected() {
    let err = derive_key("pw", &Salt::random().unwrap(), &KdfParams { iterations: 0 }).unwrap_err();
    assert!(err.to_string().contains("iteration count"));
}

#[test]
fn salt_from_slice_checks_length() {
    assert!(Salt::from_slice(&[0u8; 16]).is_ok());
    assert!(Salt::from_slice(&[0u8; 15]).is_err());
    assert!(Salt::from_slice(&[0u8; 17]).is_err());
}

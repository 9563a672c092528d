use figurine::crypto::{decrypt_buffer, AssetDecryptor, EncryptedAsset};
use figurine::PipelineError;

use crate::common::test_utils::encrypt_fixture;

mod common;

const PASSPHRASE: &str = "correct horse battery staple";

#[test]
fn round_trips_through_the_packaged_format() {
    let plaintext = b"binary model container bytes, arbitrary length".to_vec();
    let blob = encrypt_fixture(&plaintext, PASSPHRASE, [7u8; 16]);
    let recovered = decrypt_buffer(&blob, PASSPHRASE).unwrap();
    assert_eq!(recovered, plaintext);
}

#[test]
fn wrong_passphrase_is_a_decryption_failure() {
    let blob = encrypt_fixture(b"secret", PASSPHRASE, [7u8; 16]);
    let err = decrypt_buffer(&blob, "not the passphrase").unwrap_err();
    assert!(matches!(err, PipelineError::DecryptionFailed(_)), "{err}");
}

#[test]
fn truncated_ciphertext_is_a_decryption_failure() {
    let mut blob = encrypt_fixture(b"secret", PASSPHRASE, [7u8; 16]);
    blob.pop();
    let err = decrypt_buffer(&blob, PASSPHRASE).unwrap_err();
    assert!(matches!(err, PipelineError::DecryptionFailed(_)), "{err}");
}

#[test]
fn blob_shorter_than_iv_plus_one_block_is_rejected() {
    let err = decrypt_buffer(&[0u8; 16], PASSPHRASE).unwrap_err();
    assert!(matches!(err, PipelineError::DecryptionFailed(_)), "{err}");
}

#[test]
fn corrupted_iv_garbles_the_first_block_silently() {
    // CBC xors the IV into the first plaintext block only, leaving the
    // padding at the end of the last block intact: the decrypt succeeds
    // and the corruption shows up as different bytes.
    let mut blob = encrypt_fixture(b"tiny", PASSPHRASE, [7u8; 16]);
    blob[0] ^= 0xff;
    let garbled = decrypt_buffer(&blob, PASSPHRASE).unwrap();
    assert_eq!(garbled.len(), 4);
    assert_ne!(garbled, b"tiny");
    assert_eq!(&garbled[1..], b"iny");
}

#[test]
fn corrupted_final_block_is_a_decryption_failure() {
    // The padding lives in the last block, so corrupting it is caught.
    let mut blob = encrypt_fixture(b"tiny", PASSPHRASE, [7u8; 16]);
    let last = blob.len() - 1;
    blob[last] ^= 0xff;
    let err = decrypt_buffer(&blob, PASSPHRASE).unwrap_err();
    assert!(matches!(err, PipelineError::DecryptionFailed(_)), "{err}");
}

#[tokio::test]
async fn full_pipeline_decrypts_from_a_file() {
    let plaintext = b"full pipeline plaintext".to_vec();
    let blob = encrypt_fixture(&plaintext, PASSPHRASE, [42u8; 16]);
    let path = std::env::temp_dir().join("figurine_decrypt_test.bin");
    std::fs::write(&path, &blob).unwrap();

    let asset = EncryptedAsset {
        source_location: path.to_string_lossy().into_owned(),
        passphrase: PASSPHRASE.into(),
    };
    let recovered = AssetDecryptor::decrypt(&asset).await.unwrap();
    assert_eq!(recovered, plaintext);

    std::fs::remove_file(&path).ok();
}

#[tokio::test]
async fn unreachable_source_is_a_fetch_failure() {
    let asset = EncryptedAsset {
        source_location: "/definitely/not/a/real/path.bin".into(),
        passphrase: PASSPHRASE.into(),
    };
    let err = AssetDecryptor::decrypt(&asset).await.unwrap_err();
    assert!(matches!(err, PipelineError::FetchFailed(_)), "{err}");
}

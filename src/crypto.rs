//! Encrypted asset ingestion.
//!
//! The character model ships as an encrypted blob: a 16-byte initialization
//! vector followed by AES-256-CBC ciphertext of a binary model container.
//! The key is the leading 32 bytes of a SHA-256 digest of a fixed
//! passphrase. Decryption is a pure, idempotent, single-attempt operation;
//! callers decide whether to retry the whole pipeline.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use crate::error::{PipelineError, Result};

type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES-CBC block and IV size in bytes.
const BLOCK_LEN: usize = 16;

/// An encrypted model asset: where to fetch it and how to unlock it.
/// Immutable, supplied once per load.
#[derive(Clone, Debug)]
pub struct EncryptedAsset {
    /// Native: a filesystem path. WASM: a URL resolved against the page.
    pub source_location: String,
    pub passphrase: String,
}

/// Fetches and decrypts an [`EncryptedAsset`].
pub struct AssetDecryptor;

impl AssetDecryptor {
    /// Fetch the encrypted blob and decrypt it to plaintext bytes.
    ///
    /// Fails with [`PipelineError::CryptoUnavailable`] when the executing
    /// context has no cryptographic provider, [`PipelineError::FetchFailed`]
    /// when the byte source cannot be retrieved, and
    /// [`PipelineError::DecryptionFailed`] when the cipher rejects the input.
    pub async fn decrypt(asset: &EncryptedAsset) -> Result<Vec<u8>> {
        ensure_crypto_available()?;
        let raw = fetch_bytes(&asset.source_location).await?;
        decrypt_buffer(&raw, &asset.passphrase)
    }
}

/// Decrypt an already-fetched blob. The derived key exists only for the
/// duration of this call and is never persisted.
pub fn decrypt_buffer(raw: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if raw.len() < BLOCK_LEN + 1 {
        return Err(PipelineError::DecryptionFailed(format!(
            "blob of {} bytes is shorter than one IV and one cipher block",
            raw.len()
        )));
    }
    let (iv, ciphertext) = raw.split_at(BLOCK_LEN);
    if ciphertext.len() % BLOCK_LEN != 0 {
        return Err(PipelineError::DecryptionFailed(format!(
            "ciphertext of {} bytes is not block aligned",
            ciphertext.len()
        )));
    }

    let digest = Sha256::digest(passphrase.as_bytes());
    let cipher = Aes256CbcDec::new_from_slices(&digest[..32], iv)
        .map_err(|e| PipelineError::DecryptionFailed(e.to_string()))?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| {
            PipelineError::DecryptionFailed(
                "padding check failed (wrong passphrase or corrupt data)".into(),
            )
        })
}

fn ensure_crypto_available() -> Result<()> {
    #[cfg(target_arch = "wasm32")]
    {
        let secure = web_sys::window()
            .map(|w| w.is_secure_context())
            .unwrap_or(false);
        if !secure {
            return Err(PipelineError::CryptoUnavailable(
                "the page is not a secure context".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(target_arch = "wasm32")]
async fn fetch_bytes(location: &str) -> Result<Vec<u8>> {
    let response = reqwest::get(location)
        .await
        .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::FetchFailed(format!(
            "{location}: {status}"
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;
    Ok(bytes.to_vec())
}

#[cfg(not(target_arch = "wasm32"))]
async fn fetch_bytes(location: &str) -> Result<Vec<u8>> {
    std::fs::read(location)
        .map_err(|e| PipelineError::FetchFailed(format!("{location}: {e}")))
}

//! Error taxonomy for the asset ingestion pipeline.
//!
//! Every failure between "fetch the encrypted blob" and "character attached
//! to the scene" is one of these four kinds. The lifecycle manager catches
//! them at the top of the pipeline and degrades to a character-less scene;
//! none of them is fatal to the render surface.

use thiserror::Error;

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The executing context exposes no cryptographic primitive provider,
    /// e.g. the page is not a secure context. User-diagnosable and distinct
    /// from fetch/parse failures.
    #[error("cryptographic primitive provider unavailable: {0}")]
    CryptoUnavailable(String),

    /// The encrypted byte source could not be retrieved. Carries the
    /// transport status or I/O cause.
    #[error("failed to fetch encrypted asset: {0}")]
    FetchFailed(String),

    /// The cipher rejected the input: wrong key, truncated or corrupt
    /// ciphertext, or IV misalignment.
    #[error("decryption rejected the input: {0}")]
    DecryptionFailed(String),

    /// The decrypted bytes are not a valid packaged model.
    #[error("decrypted bytes are not a valid model container: {0}")]
    ParseFailed(String),
}

impl PipelineError {
    /// One-line remediation hint logged by the lifecycle manager when the
    /// load pipeline fails.
    pub fn guidance(&self) -> &'static str {
        match self {
            PipelineError::CryptoUnavailable(_) => {
                "serve the page over HTTPS or localhost so a secure context is available"
            }
            PipelineError::FetchFailed(_) => {
                "check that the encrypted asset is reachable at its configured location"
            }
            PipelineError::DecryptionFailed(_) => {
                "check the passphrase and that the asset was not truncated or corrupted"
            }
            PipelineError::ParseFailed(_) => {
                "re-export the model as a self-contained binary container and re-encrypt it"
            }
        }
    }
}

impl From<gltf::Error> for PipelineError {
    fn from(err: gltf::Error) -> Self {
        PipelineError::ParseFailed(err.to_string())
    }
}

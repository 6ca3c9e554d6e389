//! Error types for the cordon-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Key could not be decoded from PEM/PKCS#1
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext does not open under the supplied key
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Signature verification failed
    #[error("signature verification failed")]
    SignatureInvalid,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

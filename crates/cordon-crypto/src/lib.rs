//! # Cordon Crypto
//!
//! Cryptographic envelope for the Cordon group storage system.
//!
//! This crate provides:
//! - **Chunked RSA**: PKCS#1 v1.5 encryption of file payloads and key material,
//!   split into chunks that fit the key modulus
//! - **Signatures**: SHA-256 digests signed with a principal's RSA private key
//! - **Checksums**: MD5 content checksums for integrity comparison
//! - **Key Pairs**: RSA key generation with PKCS#1 PEM encoding
//!
//! Nothing in this crate knows about groups or members. Keys are handled as PEM
//! strings and parsed on every call.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cordon_crypto::{envelope, KeyPairProvider, RsaKeyProvider};
//!
//! let group = RsaKeyProvider::default().generate_key_pair()?;
//!
//! let sealed = envelope::encrypt_blob(b"Hello, World!", group.public_pem())?;
//! let opened = envelope::decrypt_blob(&sealed.ciphertext, group.private_pem())?;
//! assert_eq!(sealed.checksum, opened.checksum);
//! ```

pub mod envelope;
pub mod error;
pub mod hashing;
pub mod keys;

pub use envelope::{
    decrypt_blob, decrypt_key_material, encrypt_blob, encrypt_file, encrypt_key_material,
    sign, sign_bytes, verify, verify_bytes, OpenedBlob, SealedBlob, Signature,
};
pub use error::{CryptoError, Result};
pub use hashing::{md5_hash, Md5Hasher, Sha256Hasher};
pub use keys::{KeyPairProvider, RsaKeyPair, RsaKeyProvider};

/// Default RSA modulus size in bits
pub const RSA_KEY_BITS: usize = 2048;

/// Bytes reserved for padding in every encrypted file chunk
pub const RSA_PADDING_OVERHEAD: usize = 42;

/// Minimum PKCS#1 v1.5 encryption padding, used for key material
pub const PKCS1V15_OVERHEAD: usize = 11;

/// Read size used while hashing files for signatures
pub const MAX_READ_BUFFER: usize = 32;

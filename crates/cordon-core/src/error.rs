//! Error types for the cordon-core crate

use crate::ids::{GroupId, PrincipalId, TransactionId};
use cordon_blockstore::BlockStoreError;
use cordon_crypto::CryptoError;
use thiserror::Error;

/// Result type alias using `AccessError`
pub type Result<T> = std::result::Result<T, AccessError>;

/// Errors raised by group access control operations
#[derive(Error, Debug)]
pub enum AccessError {
    /// Group is not registered
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// Principal has no membership entry in the group
    #[error("member {member} not found in group {group}")]
    MemberNotFound { group: GroupId, member: PrincipalId },

    /// Principal is already a member of the group
    #[error("member {member} already exists in group {group}")]
    MemberAlreadyExists { group: GroupId, member: PrincipalId },

    /// Principal is not currently a member of the group
    #[error("principal {principal} is not a member of group {group}")]
    NotMember { group: GroupId, principal: PrincipalId },

    /// Key could not be decoded
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Signature did not verify against the registered key
    #[error("signature verification failed")]
    SignatureInvalid,

    /// Content does not open under the group's current key
    #[error("decryption failed: {0}")]
    DecryptionError(String),

    /// Transaction id was empty
    #[error("transaction id is empty")]
    TransactionIdEmpty,

    /// No transaction with this id
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// Local file access failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob store access failed
    #[error("block store error: {0}")]
    BlockStore(#[from] BlockStoreError),

    /// A key rotation for the group has not completed
    #[error("key rotation already in progress for group {0}")]
    RotationInProgress(GroupId),

    /// Transaction belongs to a different group than the one requested
    #[error("transaction {transaction} belongs to group {actual}, not {expected}")]
    GroupMismatch {
        transaction: TransactionId,
        expected: GroupId,
        actual: GroupId,
    },

    /// Recovered plaintext does not match the recorded checksum
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Key generation failed
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The owner cannot be removed from their own group
    #[error("owner {owner} cannot be removed from group {group}")]
    OwnerRemoval { group: GroupId, owner: PrincipalId },
}

impl From<CryptoError> for AccessError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyGeneration(msg) => AccessError::KeyGeneration(msg),
            CryptoError::InvalidKeyFormat(msg) => AccessError::InvalidKeyFormat(msg),
            CryptoError::Encryption(msg) => AccessError::Encryption(msg),
            CryptoError::Decryption(msg) => AccessError::DecryptionError(msg),
            CryptoError::SignatureInvalid => AccessError::SignatureInvalid,
            CryptoError::Io(e) => AccessError::Io(e),
        }
    }
}

impl From<serde_json::Error> for AccessError {
    fn from(err: serde_json::Error) -> Self {
        AccessError::Serialization(err.to_string())
    }
}

impl AccessError {
    /// True for failures that mean "this principal may not do this"
    pub fn is_authorization_failure(&self) -> bool {
        matches!(
            self,
            AccessError::GroupNotFound(_)
                | AccessError::MemberNotFound { .. }
                | AccessError::NotMember { .. }
                | AccessError::SignatureInvalid
        )
    }
}

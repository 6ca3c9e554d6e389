//! File, transaction and membership records

use crate::ids::{GroupId, PrincipalId, TransactionId};
use chrono::{DateTime, Utc};
use cid::Cid;
use serde::{Deserialize, Serialize};

/// Role a principal holds in a group
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Member,
}

/// Owner-side view of a group member
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub id: PrincipalId,
    /// PKCS#1 PEM public key captured at admission
    pub public_key: String,
    pub role: Role,
}

impl PrincipalRef {
    pub fn new(id: PrincipalId, public_key: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            public_key: public_key.into(),
            role,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

/// A file placed in a group.
///
/// Re-keying never edits a record in place; it produces a replacement with a
/// new handle, transaction and key version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Original file name, without directories
    pub name: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
    /// Content handle of the ciphertext
    #[serde(with = "cid_serde")]
    pub handle: Cid,
    /// Ledger entry for the current placement
    pub transaction_id: TransactionId,
    /// Principal that uploaded the file
    pub owner: PrincipalId,
    /// Group key version the ciphertext is sealed under
    pub key_version: u32,
    /// MD5 of the plaintext
    pub checksum: String,
}

/// An immutable ledger entry describing one stored ciphertext
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Principal that sealed and stored the ciphertext
    pub owner: PrincipalId,
    pub group: GroupId,
    /// MD5 of the plaintext, lower-case hex
    pub checksum: String,
    #[serde(with = "cid_serde")]
    pub handle: Cid,
    pub extension: String,
    pub key_version: u32,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn new(
        owner: PrincipalId,
        group: GroupId,
        checksum: String,
        handle: Cid,
        extension: String,
        key_version: u32,
    ) -> Self {
        Self {
            owner,
            group,
            checksum,
            handle,
            extension,
            key_version,
            created_at: Utc::now(),
        }
    }
}

pub(crate) mod cid_serde {
    use cid::Cid;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(cid: &Cid, s: S) -> Result<S::Ok, S::Error> {
        cid.to_string().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Cid, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

//! Signed request envelopes
//!
//! A request lives for the duration of one operation: the principal builds and
//! signs it, the registry verifies it, and it is dropped.

use crate::ids::{GroupId, PrincipalId};
use crate::metadata::cid_serde;
use crate::Result;
use cid::Cid;
use cordon_crypto::Signature;
use serde::{Deserialize, Serialize};

/// Request to place content in a group. The signature covers the exact bytes
/// that will be sealed and stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    pub requester: PrincipalId,
    pub group: GroupId,
    pub contents: Vec<u8>,
    pub signature: Signature,
}

impl UploadRequest {
    /// Sign `contents` with the requester's private key
    pub fn signed(
        requester: PrincipalId,
        group: GroupId,
        contents: Vec<u8>,
        private_pem: &str,
    ) -> Result<Self> {
        let signature = cordon_crypto::sign_bytes(&contents, private_pem)?;
        Ok(Self {
            requester,
            group,
            contents,
            signature,
        })
    }
}

/// Request to read a stored ciphertext.
///
/// The signature covers the canonical JSON encoding of every field except the
/// signature itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub requester: PrincipalId,
    pub group: GroupId,
    #[serde(with = "cid_serde")]
    pub handle: Cid,
    pub extension: String,
    pub signature: Signature,
}

#[derive(Serialize)]
struct DownloadRequestBody<'a> {
    requester: &'a PrincipalId,
    group: &'a GroupId,
    handle: String,
    extension: &'a str,
}

impl DownloadRequest {
    /// Build and sign a download request
    pub fn signed(
        requester: PrincipalId,
        group: GroupId,
        handle: Cid,
        extension: impl Into<String>,
        private_pem: &str,
    ) -> Result<Self> {
        let extension = extension.into();
        let body = signing_bytes(&requester, &group, &handle, &extension)?;
        let signature = cordon_crypto::sign_bytes(&body, private_pem)?;
        Ok(Self {
            requester,
            group,
            handle,
            extension,
            signature,
        })
    }

    /// Bytes the signature is computed over
    pub fn signing_bytes(&self) -> Result<Vec<u8>> {
        signing_bytes(&self.requester, &self.group, &self.handle, &self.extension)
    }
}

fn signing_bytes(
    requester: &PrincipalId,
    group: &GroupId,
    handle: &Cid,
    extension: &str,
) -> Result<Vec<u8>> {
    let body = DownloadRequestBody {
        requester,
        group,
        handle: handle.to_string(),
        extension,
    };
    Ok(serde_json::to_vec(&body)?)
}

//! Principals and their upload/download operations
//!
//! Owners and members share the [`Principal`] capability trait. Anything only
//! an owner may do is an inherent method on [`GroupOwner`] (see `group.rs`).

use crate::group::GroupMembership;
use crate::ids::{GroupId, PrincipalId, TransactionId};
use crate::metadata::{FileRecord, TransactionRecord};
use crate::operator::Operator;
use crate::registry::AccessProxy;
use crate::request::{DownloadRequest, UploadRequest};
use crate::{AccessError, Result};
use async_trait::async_trait;
use cid::Cid;
use cordon_blockstore::BlockStore;
use cordon_crypto::{KeyPairProvider, RsaKeyPair};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// A principal's id and RSA key pair
#[derive(Clone, Debug)]
pub struct Identity {
    id: PrincipalId,
    keys: RsaKeyPair,
}

impl Identity {
    /// Onboard a new principal with a fresh key pair
    pub fn generate(provider: &dyn KeyPairProvider) -> Result<Self> {
        Ok(Self::from_key_pair(provider.generate_key_pair()?))
    }

    /// Onboard a principal with an existing key pair
    pub fn from_key_pair(keys: RsaKeyPair) -> Self {
        Self {
            id: PrincipalId::new(),
            keys,
        }
    }

    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    pub fn public_key(&self) -> &str {
        self.keys.public_pem()
    }

    pub(crate) fn private_key(&self) -> &str {
        self.keys.private_pem()
    }
}

/// Result of a successful upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadReceipt {
    pub transaction_id: TransactionId,
    pub handle: Cid,
}

/// Plaintext recovered by a download
#[derive(Clone, Debug)]
pub struct DownloadedFile {
    pub plaintext: Vec<u8>,
    /// MD5 of `plaintext`, matching the ledger entry
    pub checksum: String,
    pub extension: String,
    pub handle: Cid,
}

impl DownloadedFile {
    /// Write the plaintext to `<dir>/<handle>-decrypted<extension>`
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}-decrypted{}", self.handle, self.extension));
        tokio::fs::write(&path, &self.plaintext).await?;
        Ok(path)
    }
}

/// Capabilities shared by owners and members
#[async_trait]
pub trait Principal: Send + Sync {
    fn identity(&self) -> &Identity;

    /// Whether this principal owns groups
    fn is_owner(&self) -> bool;

    fn id(&self) -> &PrincipalId {
        self.identity().id()
    }

    fn public_key(&self) -> &str {
        self.identity().public_key()
    }

    fn is_member_of(&self, registry: &AccessProxy, group: &GroupId) -> bool {
        registry.is_member(group, self.id())
    }

    /// Encrypt a file under the group key and record it with `owner`
    async fn upload<S: BlockStore + 'static>(
        &self,
        operator: &Operator<S>,
        owner: &GroupOwner,
        group: &GroupId,
        file_path: &Path,
    ) -> Result<UploadReceipt> {
        upload_file(self.identity(), operator, owner, group, file_path).await
    }

    /// Fetch and decrypt the file a transaction points at
    async fn download<S: BlockStore + 'static>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        transaction_id: &str,
    ) -> Result<DownloadedFile> {
        download_file(self.identity(), operator, group, transaction_id).await
    }
}

/// A principal admitted to groups by an owner
#[derive(Clone, Debug)]
pub struct GroupMember {
    identity: Identity,
}

impl GroupMember {
    pub fn new(provider: &dyn KeyPairProvider) -> Result<Self> {
        Ok(Self::from_identity(Identity::generate(provider)?))
    }

    pub fn from_identity(identity: Identity) -> Self {
        Self { identity }
    }
}

impl Principal for GroupMember {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn is_owner(&self) -> bool {
        false
    }
}

/// A principal that creates groups and controls their membership
pub struct GroupOwner {
    identity: Identity,
    pub(crate) groups: RwLock<HashMap<GroupId, GroupMembership>>,
}

impl GroupOwner {
    pub fn new(provider: &dyn KeyPairProvider) -> Result<Self> {
        Ok(Self::from_identity(Identity::generate(provider)?))
    }

    pub fn from_identity(identity: Identity) -> Self {
        Self {
            identity,
            groups: RwLock::new(HashMap::new()),
        }
    }
}

impl Principal for GroupOwner {
    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn is_owner(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for GroupOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupOwner")
            .field("identity", &self.identity)
            .field("groups", &self.groups.read().len())
            .finish()
    }
}

#[instrument(skip(identity, operator, owner), fields(principal = %identity.id()))]
async fn upload_file<S: BlockStore>(
    identity: &Identity,
    operator: &Operator<S>,
    owner: &GroupOwner,
    group: &GroupId,
    file_path: &Path,
) -> Result<UploadReceipt> {
    let _guard = operator.locks().write(group).await;
    let registry = operator.registry();

    if !registry.is_member(group, identity.id()) {
        return Err(AccessError::NotMember {
            group: group.clone(),
            principal: identity.id().clone(),
        });
    }
    if !owner.owns_group(group) {
        return Err(AccessError::GroupNotFound(group.clone()));
    }

    // Read once: the signed bytes are the sealed bytes
    let contents = tokio::fs::read(file_path).await?;
    let request = UploadRequest::signed(
        identity.id().clone(),
        group.clone(),
        contents,
        identity.private_key(),
    )?;
    registry.verify_upload_authorization(&request)?;

    let group_key = registry.lookup_group_public_key(group)?;
    let key_version = registry.group_key_version(group)?;
    let sealed = cordon_crypto::encrypt_blob(&request.contents, &group_key)?;
    let handle = operator.store().put_block(&sealed.ciphertext).await?;

    let extension = file_extension(file_path);
    let transaction_id = operator.ledger().append(TransactionRecord::new(
        identity.id().clone(),
        group.clone(),
        sealed.checksum.clone(),
        handle,
        extension.clone(),
        key_version,
    ));

    owner.record_file(
        group,
        FileRecord {
            name: file_name(file_path),
            extension,
            handle,
            transaction_id: transaction_id.clone(),
            owner: identity.id().clone(),
            key_version,
            checksum: sealed.checksum,
        },
    )?;

    info!(group = %group, transaction = %transaction_id, handle = %handle, "File uploaded");
    Ok(UploadReceipt {
        transaction_id,
        handle,
    })
}

#[instrument(skip(identity, operator), fields(principal = %identity.id()))]
async fn download_file<S: BlockStore>(
    identity: &Identity,
    operator: &Operator<S>,
    group: &GroupId,
    transaction_id: &str,
) -> Result<DownloadedFile> {
    let _guard = operator.locks().read(group).await;
    let registry = operator.registry();

    let record = operator.ledger().lookup(transaction_id)?;
    if &record.group != group {
        return Err(AccessError::GroupMismatch {
            transaction: TransactionId::from(transaction_id),
            expected: group.clone(),
            actual: record.group,
        });
    }

    // Content sealed under a retired key was deleted when the group re-keyed
    let current_version = registry.group_key_version(group)?;
    if record.key_version < current_version {
        return Err(AccessError::DecryptionError(format!(
            "transaction {} was sealed under key version {}, group is at version {}",
            transaction_id, record.key_version, current_version
        )));
    }

    let request = DownloadRequest::signed(
        identity.id().clone(),
        group.clone(),
        record.handle,
        record.extension.clone(),
        identity.private_key(),
    )?;
    registry.verify_download_authorization(&request)?;

    let ciphertext = operator.store().get_block(&request.handle).await?;
    let group_key = registry.lookup_group_private_key(group)?;
    let opened = cordon_crypto::decrypt_blob(&ciphertext, &group_key)?;

    if opened.checksum != record.checksum {
        return Err(AccessError::ChecksumMismatch {
            expected: record.checksum,
            actual: opened.checksum,
        });
    }

    info!(group = %group, transaction = %transaction_id, "File downloaded");
    Ok(DownloadedFile {
        plaintext: opened.plaintext,
        checksum: opened.checksum,
        extension: record.extension,
        handle: record.handle,
    })
}

/// Extension with its leading dot, or empty
fn file_extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

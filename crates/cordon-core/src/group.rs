//! Group lifecycle and lazy revocation
//!
//! Removing a member only blocks future authorization. To make previously
//! shared files unreachable as well, [`GroupOwner::remove_member_and_secure_files`]
//! rotates the group key and re-seals every file of the group under the new
//! key, deleting the old ciphertext as it goes.
//!
//! ```text
//!   Active ──rotate_group_key──▶ Rotating{retired} ──complete_rotation──▶ Active
//!                                    │      ▲
//!                                    └──────┘ resume_rotation
//! ```
//!
//! Each file carries the key version it is sealed under, so a re-key pass skips
//! files that are already current and can be re-run after an interruption.

use crate::ids::{GroupId, PrincipalId};
use crate::metadata::{FileRecord, PrincipalRef, Role, TransactionRecord};
use crate::operator::Operator;
use crate::principal::{GroupOwner, Principal};
use crate::registry::{AccessProxy, RetiredKey};
use crate::{AccessError, Result};
use cordon_blockstore::BlockStore;
use tracing::{debug, info, instrument, warn};

/// Owner-side state of one group
#[derive(Clone, Debug)]
pub struct GroupMembership {
    group_id: GroupId,
    members: Vec<PrincipalRef>,
    files: Vec<FileRecord>,
    /// Fingerprint of the group key the owner last saw
    key_fingerprint: String,
}

impl GroupMembership {
    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn members(&self) -> &[PrincipalRef] {
        &self.members
    }

    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    pub fn key_fingerprint(&self) -> &str {
        &self.key_fingerprint
    }

    fn position_of(&self, member: &PrincipalId) -> Option<usize> {
        self.members.iter().position(|m| &m.id == member)
    }
}

/// A file the re-key pass could not migrate. It is no longer listed.
#[derive(Clone, Debug)]
pub struct RekeyFailure {
    pub file: FileRecord,
    pub reason: String,
}

/// Outcome of a re-key pass
#[derive(Clone, Debug)]
pub struct RotationReport {
    /// Replacement records for files migrated by this pass
    pub rekeyed: Vec<FileRecord>,
    pub failures: Vec<RekeyFailure>,
    pub new_key_version: u32,
}

impl RotationReport {
    fn new(new_key_version: u32) -> Self {
        Self {
            rekeyed: Vec::new(),
            failures: Vec::new(),
            new_key_version,
        }
    }

    /// True when every pending file was migrated
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl GroupOwner {
    /// Register a new group with this owner as its only member
    pub fn create_group<S: BlockStore>(&self, operator: &Operator<S>) -> Result<GroupId> {
        let (group_id, key_pair) = operator
            .registry()
            .register_group(self.id(), self.public_key())?;

        let membership = GroupMembership {
            group_id: group_id.clone(),
            members: vec![PrincipalRef::new(
                self.id().clone(),
                self.public_key(),
                Role::Owner,
            )],
            files: Vec::new(),
            key_fingerprint: key_pair.fingerprint(),
        };
        self.groups.write().insert(group_id.clone(), membership);
        operator.locks().register(&group_id);

        info!(group = %group_id, owner = %self.id(), "Group created");
        Ok(group_id)
    }

    /// Whether this owner created `group`
    pub fn owns_group(&self, group: &GroupId) -> bool {
        self.groups.read().contains_key(group)
    }

    /// Groups created by this owner
    pub fn groups(&self) -> Vec<GroupId> {
        self.groups.read().keys().cloned().collect()
    }

    /// Snapshot of a group's owner-side state
    pub fn membership(&self, group: &GroupId) -> Result<GroupMembership> {
        self.groups
            .read()
            .get(group)
            .cloned()
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))
    }

    /// Files currently placed in the group
    pub fn list_files(&self, group: &GroupId) -> Result<Vec<FileRecord>> {
        self.membership(group).map(|m| m.files)
    }

    /// Members in admission order, owner first
    pub fn list_members(&self, group: &GroupId) -> Result<Vec<PrincipalRef>> {
        self.membership(group).map(|m| m.members)
    }

    /// Admit `member` to `group`.
    ///
    /// The owner-side list and the registry either both gain the member or
    /// neither changes.
    #[instrument(skip(self, operator, member), fields(member = %member.id()))]
    pub async fn add_member_object<S, P>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        member: &P,
    ) -> Result<()>
    where
        S: BlockStore,
        P: Principal + ?Sized,
    {
        let _guard = operator.locks().write(group).await;
        let entry = PrincipalRef::new(member.id().clone(), member.public_key(), Role::Member);

        let mut groups = self.groups.write();
        let membership = groups
            .get_mut(group)
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))?;
        if membership.position_of(&entry.id).is_some() {
            return Err(AccessError::MemberAlreadyExists {
                group: group.clone(),
                member: entry.id,
            });
        }

        operator
            .registry()
            .add_member(group, &entry.id, &entry.public_key)?;
        membership.members.push(entry);

        info!(group = %group, "Member added");
        Ok(())
    }

    /// Remove `member` from `group` without touching stored files.
    ///
    /// The member can no longer pass authorization, but anyone who kept the
    /// old group key could still open existing ciphertext. Use
    /// [`remove_member_and_secure_files`](Self::remove_member_and_secure_files)
    /// to close that gap.
    #[instrument(skip(self, operator))]
    pub async fn remove_member_object<S: BlockStore>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        member: &PrincipalId,
    ) -> Result<()> {
        let _guard = operator.locks().write(group).await;
        self.dismiss(operator.registry(), group, member)?;
        info!(group = %group, member = %member, "Member removed");
        Ok(())
    }

    fn dismiss(&self, registry: &AccessProxy, group: &GroupId, member: &PrincipalId) -> Result<()> {
        let mut groups = self.groups.write();
        let membership = groups
            .get_mut(group)
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))?;
        let position = membership
            .position_of(member)
            .ok_or_else(|| AccessError::MemberNotFound {
                group: group.clone(),
                member: member.clone(),
            })?;
        if membership.members[position].is_owner() {
            return Err(AccessError::OwnerRemoval {
                group: group.clone(),
                owner: member.clone(),
            });
        }

        registry.remove_member(group, member)?;
        membership.members.remove(position);
        Ok(())
    }

    /// Remove `member`, rotate the group key and re-seal every group file.
    ///
    /// Afterwards no handle or transaction created before the call can be
    /// opened, by the removed member or anyone else. Files that fail to
    /// migrate are dropped from the group and listed in the report.
    #[instrument(skip(self, operator))]
    pub async fn remove_member_and_secure_files<S: BlockStore>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        member: &PrincipalId,
    ) -> Result<RotationReport> {
        let _guard = operator.locks().write(group).await;
        let registry = operator.registry();

        if !self.owns_group(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        if registry.is_rotating(group)? {
            return Err(AccessError::RotationInProgress(group.clone()));
        }

        self.dismiss(registry, group, member)?;
        info!(group = %group, member = %member, "Member removed, rotating group key");

        let retired = registry.rotate_group_key(group)?;
        let report = self.rekey_files(operator, group, &retired).await?;
        self.finish_rotation(registry, group)?;

        info!(
            group = %group,
            version = report.new_key_version,
            rekeyed = report.rekeyed.len(),
            failed = report.failures.len(),
            "Group secured"
        );
        Ok(report)
    }

    /// Finish a rotation that was interrupted before completing.
    ///
    /// Returns `None` when no rotation is pending. Files already sealed under
    /// the current key are left alone.
    #[instrument(skip(self, operator))]
    pub async fn resume_rotation<S: BlockStore>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
    ) -> Result<Option<RotationReport>> {
        let _guard = operator.locks().write(group).await;
        let registry = operator.registry();

        if !self.owns_group(group) {
            return Err(AccessError::GroupNotFound(group.clone()));
        }
        let Some(retired) = registry.retired_key(group)? else {
            return Ok(None);
        };

        let report = self.rekey_files(operator, group, &retired).await?;
        self.finish_rotation(registry, group)?;

        info!(group = %group, rekeyed = report.rekeyed.len(), "Rotation resumed and completed");
        Ok(Some(report))
    }

    fn finish_rotation(&self, registry: &AccessProxy, group: &GroupId) -> Result<()> {
        registry.complete_rotation(group)?;
        let fingerprint = cordon_crypto::keys::fingerprint(&registry.lookup_group_public_key(group)?);
        if let Some(membership) = self.groups.write().get_mut(group) {
            membership.key_fingerprint = fingerprint;
        }
        Ok(())
    }

    /// Migrate every file not yet sealed under the current key
    async fn rekey_files<S: BlockStore>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        retired: &RetiredKey,
    ) -> Result<RotationReport> {
        let registry = operator.registry();
        let new_version = registry.group_key_version(group)?;
        let new_public = registry.lookup_group_public_key(group)?;

        let pending: Vec<FileRecord> = self
            .list_files(group)?
            .into_iter()
            .filter(|file| file.key_version < new_version)
            .collect();
        debug!(group = %group, pending = pending.len(), "Re-keying group files");

        let mut report = RotationReport::new(new_version);
        for file in pending {
            match self
                .rekey_file(operator, group, &file, retired, &new_public, new_version)
                .await
            {
                Ok(replacement) => {
                    self.replace_file(group, &file, Some(replacement.clone()));
                    report.rekeyed.push(replacement);
                }
                Err(e) => {
                    warn!(
                        group = %group,
                        transaction = %file.transaction_id,
                        handle = %file.handle,
                        error = %e,
                        "Skipping file that could not be re-keyed"
                    );
                    self.replace_file(group, &file, None);
                    report.failures.push(RekeyFailure {
                        file,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn rekey_file<S: BlockStore>(
        &self,
        operator: &Operator<S>,
        group: &GroupId,
        file: &FileRecord,
        retired: &RetiredKey,
        new_public: &str,
        new_version: u32,
    ) -> Result<FileRecord> {
        let store = operator.store();

        let ciphertext = store.get_block(&file.handle).await?;
        let opened = cordon_crypto::decrypt_blob(&ciphertext, retired.key_pair.private_pem())?;
        if opened.checksum != file.checksum {
            return Err(AccessError::ChecksumMismatch {
                expected: file.checksum.clone(),
                actual: opened.checksum,
            });
        }
        store.delete_block(&file.handle).await?;

        let sealed = cordon_crypto::encrypt_blob(&opened.plaintext, new_public)?;
        let handle = store.put_block(&sealed.ciphertext).await?;
        let transaction_id = operator.ledger().append(TransactionRecord::new(
            self.id().clone(),
            group.clone(),
            sealed.checksum.clone(),
            handle,
            file.extension.clone(),
            new_version,
        ));

        debug!(
            group = %group,
            old_handle = %file.handle,
            new_handle = %handle,
            transaction = %transaction_id,
            "File re-keyed"
        );
        Ok(FileRecord {
            name: file.name.clone(),
            extension: file.extension.clone(),
            handle,
            transaction_id,
            owner: file.owner.clone(),
            key_version: new_version,
            checksum: sealed.checksum,
        })
    }

    /// Swap or drop a file record, keeping list order
    fn replace_file(&self, group: &GroupId, file: &FileRecord, replacement: Option<FileRecord>) {
        let mut groups = self.groups.write();
        let Some(membership) = groups.get_mut(group) else {
            return;
        };
        let Some(position) = membership
            .files
            .iter()
            .position(|f| f.transaction_id == file.transaction_id)
        else {
            return;
        };

        match replacement {
            Some(record) => membership.files[position] = record,
            None => {
                membership.files.remove(position);
            }
        }
    }

    pub(crate) fn record_file(&self, group: &GroupId, file: FileRecord) -> Result<()> {
        let mut groups = self.groups.write();
        let membership = groups
            .get_mut(group)
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))?;
        membership.files.push(file);
        Ok(())
    }
}

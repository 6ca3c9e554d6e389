//! Membership registry
//!
//! The `AccessProxy` holds, per group, the group key pair and the public key of
//! every admitted principal. It is the only place a group private key lives
//! after creation, and every upload or download is authorized here by checking
//! the requester's signature against the key recorded at admission.

use crate::ids::{GroupId, PrincipalId};
use crate::request::{DownloadRequest, UploadRequest};
use crate::{AccessError, Result};
use cordon_crypto::{KeyPairProvider, RsaKeyPair};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use zeroize::Zeroizing;

/// The key pair a group's files are sealed under
pub type GroupKeyPair = RsaKeyPair;

/// A principal admitted to a group
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberEntry {
    pub id: PrincipalId,
    pub public_key: String,
}

/// A key pair taken out of service by a rotation
#[derive(Clone, Debug)]
pub struct RetiredKey {
    pub key_pair: GroupKeyPair,
    /// Version the key was current at
    pub version: u32,
}

/// Where a group is in its key lifecycle
#[derive(Clone, Debug, Default)]
pub enum RotationState {
    #[default]
    Active,
    /// A new key is current, and files sealed under `retired` may remain
    Rotating { retired: RetiredKey },
}

/// Registry state for one group
#[derive(Clone, Debug)]
pub struct GroupRecord {
    pub id: GroupId,
    pub owner: PrincipalId,
    pub key_pair: GroupKeyPair,
    pub key_version: u32,
    /// Admission order
    pub members: Vec<MemberEntry>,
    pub state: RotationState,
}

impl GroupRecord {
    fn member(&self, id: &PrincipalId) -> Option<&MemberEntry> {
        self.members.iter().find(|m| &m.id == id)
    }
}

/// Access-control proxy over all groups
pub struct AccessProxy {
    groups: RwLock<HashMap<GroupId, GroupRecord>>,
    keys: Arc<dyn KeyPairProvider>,
}

impl AccessProxy {
    /// Create an empty registry that draws group keys from `keys`
    pub fn new(keys: Arc<dyn KeyPairProvider>) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            keys,
        }
    }

    /// Register a new group whose sole member is its owner.
    ///
    /// The returned key pair is handed to the owner for the creation step only.
    #[instrument(skip(self, owner_public_key))]
    pub fn register_group(
        &self,
        owner: &PrincipalId,
        owner_public_key: &str,
    ) -> Result<(GroupId, GroupKeyPair)> {
        cordon_crypto::keys::parse_public_key(owner_public_key)?;
        let key_pair = self.keys.generate_key_pair()?;
        let id = GroupId::new();

        let record = GroupRecord {
            id: id.clone(),
            owner: owner.clone(),
            key_pair: key_pair.clone(),
            key_version: 1,
            members: vec![MemberEntry {
                id: owner.clone(),
                public_key: owner_public_key.to_string(),
            }],
            state: RotationState::Active,
        };
        self.groups.write().insert(id.clone(), record);

        info!(group = %id, key = %key_pair.fingerprint(), "Group registered");
        Ok((id, key_pair))
    }

    fn with_group<T>(&self, group: &GroupId, f: impl FnOnce(&GroupRecord) -> Result<T>) -> Result<T> {
        let groups = self.groups.read();
        let record = groups
            .get(group)
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))?;
        f(record)
    }

    fn with_group_mut<T>(
        &self,
        group: &GroupId,
        f: impl FnOnce(&mut GroupRecord) -> Result<T>,
    ) -> Result<T> {
        let mut groups = self.groups.write();
        let record = groups
            .get_mut(group)
            .ok_or_else(|| AccessError::GroupNotFound(group.clone()))?;
        f(record)
    }

    /// Public key recorded for `principal` when it was admitted to `group`
    pub fn lookup_member_public_key(&self, group: &GroupId, principal: &PrincipalId) -> Result<String> {
        self.with_group(group, |record| {
            record
                .member(principal)
                .map(|m| m.public_key.clone())
                .ok_or_else(|| AccessError::MemberNotFound {
                    group: group.clone(),
                    member: principal.clone(),
                })
        })
    }

    /// Current group public key
    pub fn lookup_group_public_key(&self, group: &GroupId) -> Result<String> {
        self.with_group(group, |record| Ok(record.key_pair.public_pem().to_string()))
    }

    /// Current group private key
    pub fn lookup_group_private_key(&self, group: &GroupId) -> Result<Zeroizing<String>> {
        self.with_group(group, |record| {
            Ok(Zeroizing::new(record.key_pair.private_pem().to_string()))
        })
    }

    /// Version of the current group key
    pub fn group_key_version(&self, group: &GroupId) -> Result<u32> {
        self.with_group(group, |record| Ok(record.key_version))
    }

    /// Principal that registered the group
    pub fn group_owner(&self, group: &GroupId) -> Result<PrincipalId> {
        self.with_group(group, |record| Ok(record.owner.clone()))
    }

    /// Snapshot of the member list in admission order
    pub fn members(&self, group: &GroupId) -> Result<Vec<MemberEntry>> {
        self.with_group(group, |record| Ok(record.members.clone()))
    }

    /// Whether `principal` is currently admitted. False for unknown groups.
    pub fn is_member(&self, group: &GroupId, principal: &PrincipalId) -> bool {
        self.groups
            .read()
            .get(group)
            .is_some_and(|record| record.member(principal).is_some())
    }

    /// Whether the group exists
    pub fn contains_group(&self, group: &GroupId) -> bool {
        self.groups.read().contains_key(group)
    }

    /// Admit a principal. Re-adding an existing member is rejected.
    #[instrument(skip(self, public_key))]
    pub fn add_member(&self, group: &GroupId, member: &PrincipalId, public_key: &str) -> Result<()> {
        cordon_crypto::keys::parse_public_key(public_key)?;
        self.with_group_mut(group, |record| {
            if record.member(member).is_some() {
                return Err(AccessError::MemberAlreadyExists {
                    group: group.clone(),
                    member: member.clone(),
                });
            }
            record.members.push(MemberEntry {
                id: member.clone(),
                public_key: public_key.to_string(),
            });
            Ok(())
        })?;

        debug!(group = %group, member = %member, "Member entry added");
        Ok(())
    }

    /// Delete a member entry, ending its ability to pass verification
    #[instrument(skip(self))]
    pub fn remove_member(&self, group: &GroupId, member: &PrincipalId) -> Result<()> {
        self.with_group_mut(group, |record| {
            if &record.owner == member {
                return Err(AccessError::OwnerRemoval {
                    group: group.clone(),
                    owner: member.clone(),
                });
            }
            let position = record
                .members
                .iter()
                .position(|m| &m.id == member)
                .ok_or_else(|| AccessError::MemberNotFound {
                    group: group.clone(),
                    member: member.clone(),
                })?;
            record.members.remove(position);
            Ok(())
        })?;

        debug!(group = %group, member = %member, "Member entry removed");
        Ok(())
    }

    /// Check an upload request's signature over its contents
    pub fn verify_upload_authorization(&self, request: &UploadRequest) -> Result<()> {
        let public_key = self.lookup_member_public_key(&request.group, &request.requester)?;
        cordon_crypto::verify_bytes(&request.contents, &request.signature, &public_key)?;
        Ok(())
    }

    /// Check a download request's signature over its canonical encoding
    pub fn verify_download_authorization(&self, request: &DownloadRequest) -> Result<()> {
        let public_key = self.lookup_member_public_key(&request.group, &request.requester)?;
        let body = request.signing_bytes()?;
        cordon_crypto::verify_bytes(&body, &request.signature, &public_key)?;
        Ok(())
    }

    /// Replace the group key with a fresh pair and return the old one.
    ///
    /// The group stays `Rotating` until [`complete_rotation`](Self::complete_rotation).
    #[instrument(skip(self))]
    pub fn rotate_group_key(&self, group: &GroupId) -> Result<RetiredKey> {
        self.with_group(group, |record| match record.state {
            RotationState::Active => Ok(()),
            RotationState::Rotating { .. } => Err(AccessError::RotationInProgress(group.clone())),
        })?;

        // Generated outside the lock; state is re-checked before the swap
        let fresh = self.keys.generate_key_pair()?;

        self.with_group_mut(group, |record| {
            if let RotationState::Rotating { .. } = record.state {
                return Err(AccessError::RotationInProgress(group.clone()));
            }

            let retired = RetiredKey {
                key_pair: std::mem::replace(&mut record.key_pair, fresh),
                version: record.key_version,
            };
            record.key_version += 1;
            record.state = RotationState::Rotating {
                retired: retired.clone(),
            };

            info!(
                group = %group,
                version = record.key_version,
                key = %record.key_pair.fingerprint(),
                "Group key rotated"
            );
            Ok(retired)
        })
    }

    /// The retained pre-rotation key while a rotation is pending
    pub fn retired_key(&self, group: &GroupId) -> Result<Option<RetiredKey>> {
        self.with_group(group, |record| match &record.state {
            RotationState::Active => Ok(None),
            RotationState::Rotating { retired } => Ok(Some(retired.clone())),
        })
    }

    /// Whether a rotation is pending
    pub fn is_rotating(&self, group: &GroupId) -> Result<bool> {
        self.retired_key(group).map(|retired| retired.is_some())
    }

    /// Return to `Active`, dropping the retired key
    #[instrument(skip(self))]
    pub fn complete_rotation(&self, group: &GroupId) -> Result<()> {
        self.with_group_mut(group, |record| {
            record.state = RotationState::Active;
            Ok(())
        })?;
        debug!(group = %group, "Rotation completed, retired key dropped");
        Ok(())
    }
}

impl std::fmt::Debug for AccessProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessProxy")
            .field("groups", &self.groups.read().len())
            .finish()
    }
}

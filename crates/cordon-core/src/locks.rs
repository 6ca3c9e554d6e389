//! Per-group operation locks
//!
//! Membership changes, rotation and uploads take a group's lock exclusively;
//! downloads share it. Guards are owned so they can be held across `.await`.
//!
//! Only registered groups get a slot in the map. Requests naming an unknown
//! group lock a throwaway instance and fail on their own checks, so the map
//! never grows past the set of created groups.

use crate::ids::GroupId;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

/// One lock per registered group
#[derive(Default)]
pub struct GroupLocks {
    locks: DashMap<GroupId, Arc<RwLock<()>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give a newly created group its lock
    pub fn register(&self, group: &GroupId) {
        self.locks
            .entry(group.clone())
            .or_insert_with(|| Arc::new(RwLock::new(())));
    }

    pub fn is_registered(&self, group: &GroupId) -> bool {
        self.locks.contains_key(group)
    }

    fn lock_for(&self, group: &GroupId) -> Arc<RwLock<()>> {
        // Clone the Arc so no map shard guard lives across an await
        match self.locks.get(group) {
            Some(lock) => Arc::clone(lock.value()),
            None => Arc::new(RwLock::new(())),
        }
    }

    /// Exclusive access to a group
    pub async fn write(&self, group: &GroupId) -> OwnedRwLockWriteGuard<()> {
        self.lock_for(group).write_owned().await
    }

    /// Shared access to a group
    pub async fn read(&self, group: &GroupId) -> OwnedRwLockReadGuard<()> {
        self.lock_for(group).read_owned().await
    }

    /// Number of registered groups
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn registered(locks: &GroupLocks) -> GroupId {
        let group = GroupId::new();
        locks.register(&group);
        group
    }

    #[tokio::test]
    async fn test_readers_share() {
        let locks = GroupLocks::new();
        let group = registered(&locks);

        let _a = locks.read(&group).await;
        let _b = locks.read(&group).await;
        assert_eq!(locks.len(), 1);
    }

    #[tokio::test]
    async fn test_writer_excludes_readers() {
        let locks = Arc::new(GroupLocks::new());
        let group = registered(&locks);

        let guard = locks.write(&group).await;
        let blocked = tokio::time::timeout(Duration::from_millis(50), locks.read(&group)).await;
        assert!(blocked.is_err());

        drop(guard);
        let _reader = locks.read(&group).await;
    }

    #[tokio::test]
    async fn test_groups_are_independent() {
        let locks = GroupLocks::new();
        let _g1 = locks.write(&registered(&locks)).await;
        let other =
            tokio::time::timeout(Duration::from_millis(50), locks.write(&registered(&locks))).await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_groups_leave_no_entry() {
        let locks = GroupLocks::new();
        for _ in 0..10 {
            let _w = locks.write(&GroupId::new()).await;
            let _r = locks.read(&GroupId::new()).await;
        }
        assert!(locks.is_empty());

        let group = registered(&locks);
        locks.register(&group);
        assert_eq!(locks.len(), 1);
        assert!(locks.is_registered(&group));
    }
}

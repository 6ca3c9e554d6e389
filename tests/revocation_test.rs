//! End-to-end tests for group membership and revocation
//!
//! Each test runs owners and members against an in-memory block store.

use cordon_blockstore::{BlockStore, BlockStoreError, MemoryBlockStore};
use cordon_core::{
    AccessError, GroupId, GroupMember, GroupOwner, Operator, Principal, TransactionRecord,
};
use cordon_crypto::{decrypt_blob, encrypt_blob, md5_hash, RsaKeyProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

const SAMPLE: &[u8] = b"Minutes of the board meeting. Not for circulation outside the group.\n";

struct Harness {
    operator: Operator<MemoryBlockStore>,
    owner: GroupOwner,
    group: GroupId,
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let operator = Operator::new(
            Arc::new(MemoryBlockStore::new()),
            Arc::new(RsaKeyProvider::new(1024)),
        );
        let owner = GroupOwner::new(operator.key_provider()).unwrap();
        let group = owner.create_group(&operator).unwrap();
        Self {
            operator,
            owner,
            group,
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn principal(&self) -> GroupMember {
        GroupMember::new(self.operator.key_provider()).unwrap()
    }

    async fn admitted(&self) -> GroupMember {
        let member = self.principal();
        self.owner
            .add_member_object(&self.operator, &self.group, &member)
            .await
            .unwrap();
        member
    }

    fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    async fn upload(&self, who: &impl Principal, path: &Path) -> cordon_core::UploadReceipt {
        who.upload(&self.operator, &self.owner, &self.group, path)
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_outsider_cannot_upload() {
    let h = Harness::new();
    let outsider = h.principal();
    let path = h.write("sample.txt", SAMPLE);

    let result = outsider.upload(&h.operator, &h.owner, &h.group, &path).await;
    assert!(matches!(result, Err(AccessError::NotMember { .. })));
    assert!(h.operator.ledger().is_empty());
    assert!(h.owner.list_files(&h.group).unwrap().is_empty());
}

#[tokio::test]
async fn test_removed_member_cannot_upload() {
    let h = Harness::new();
    let member = h.admitted().await;
    h.owner
        .remove_member_object(&h.operator, &h.group, member.id())
        .await
        .unwrap();

    let path = h.write("sample.txt", SAMPLE);
    let result = member.upload(&h.operator, &h.owner, &h.group, &path).await;
    assert!(matches!(result, Err(AccessError::NotMember { .. })));
}

#[tokio::test]
async fn test_group_key_roundtrip() {
    let h = Harness::new();
    let registry = h.operator.registry();
    let public = registry.lookup_group_public_key(&h.group).unwrap();
    let private = registry.lookup_group_private_key(&h.group).unwrap();

    let sealed = encrypt_blob(SAMPLE, &public).unwrap();
    let opened = decrypt_blob(&sealed.ciphertext, &private).unwrap();
    assert_eq!(opened.plaintext, SAMPLE);
    assert_eq!(opened.checksum, sealed.checksum);
}

#[test_log::test(tokio::test)]
async fn test_member_upload_download_roundtrip() {
    let h = Harness::new();
    let member = h.admitted().await;
    let other = h.admitted().await;
    let path = h.write("notes.md", SAMPLE);

    let receipt = h.upload(&member, &path).await;

    for who in [&member, &other] {
        let file = who
            .download(&h.operator, &h.group, receipt.transaction_id.as_str())
            .await
            .unwrap();
        assert_eq!(file.plaintext, SAMPLE);
        assert_eq!(file.checksum, md5_hash(SAMPLE));
        assert_eq!(file.extension, ".md");
        assert_eq!(file.handle, receipt.handle);
    }

    let owner_copy = h
        .owner
        .download(&h.operator, &h.group, receipt.transaction_id.as_str())
        .await
        .unwrap();
    assert_eq!(owner_copy.plaintext, SAMPLE);
}

#[tokio::test]
async fn test_upload_stores_ciphertext_only() {
    let h = Harness::new();
    let member = h.admitted().await;
    let path = h.write("sample.txt", SAMPLE);

    let receipt = h.upload(&member, &path).await;
    let stored = h.operator.store().get_block(&receipt.handle).await.unwrap();
    assert_ne!(stored.as_ref(), SAMPLE);
    let prefix = &SAMPLE[..16];
    assert!(!stored.windows(prefix.len()).any(|w| w == prefix));
}

#[test_log::test(tokio::test)]
async fn test_revocation_locks_out_old_content() {
    let h = Harness::new();
    let member = h.admitted().await;
    let path = h.write("sample.txt", SAMPLE);
    let t1 = h.upload(&member, &path).await;
    let old_key = h
        .operator
        .registry()
        .lookup_group_private_key(&h.group)
        .unwrap();

    let report = h
        .owner
        .remove_member_and_secure_files(&h.operator, &h.group, member.id())
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_eq!(report.rekeyed.len(), 1);
    assert_eq!(report.new_key_version, 2);

    // The stale transaction fails for everyone
    for result in [
        member
            .download(&h.operator, &h.group, t1.transaction_id.as_str())
            .await,
        h.owner
            .download(&h.operator, &h.group, t1.transaction_id.as_str())
            .await,
    ] {
        assert!(matches!(result, Err(AccessError::DecryptionError(_))));
    }

    // The pre-revocation ciphertext is gone
    let fetched = h.operator.store().get_block(&t1.handle).await;
    assert!(matches!(fetched, Err(BlockStoreError::NotFound(_))));

    // The retired key cannot open the re-sealed blob
    let rekeyed = &report.rekeyed[0];
    assert_ne!(rekeyed.handle, t1.handle);
    let ciphertext = h.operator.store().get_block(&rekeyed.handle).await.unwrap();
    match decrypt_blob(&ciphertext, &old_key) {
        Err(_) => {}
        Ok(opened) => assert_ne!(opened.plaintext, SAMPLE),
    }

    assert!(!h.operator.registry().is_rotating(&h.group).unwrap());
    assert!(h.operator.registry().retired_key(&h.group).unwrap().is_none());
}

#[tokio::test]
async fn test_empty_files_are_isolated_across_groups() {
    let h = Harness::new();
    let other_group = h.owner.create_group(&h.operator).unwrap();
    let member = h.admitted().await;
    h.owner
        .add_member_object(&h.operator, &other_group, &member)
        .await
        .unwrap();

    let empty = h.write("empty.txt", b"");
    let in_first = h.upload(&member, &empty).await;
    let in_other = member
        .upload(&h.operator, &h.owner, &other_group, &empty)
        .await
        .unwrap();
    assert_ne!(in_first.handle, in_other.handle);

    let report = h
        .owner
        .remove_member_and_secure_files(&h.operator, &h.group, member.id())
        .await
        .unwrap();
    assert!(report.is_complete());
    assert_ne!(report.rekeyed[0].handle, in_first.handle);
    let fetched = h.operator.store().get_block(&in_first.handle).await;
    assert!(matches!(fetched, Err(BlockStoreError::NotFound(_))));

    // The other group's empty file is untouched
    assert!(h.operator.store().has_block(&in_other.handle).await.unwrap());
    let file = member
        .download(&h.operator, &other_group, in_other.transaction_id.as_str())
        .await
        .unwrap();
    assert!(file.plaintext.is_empty());
    assert_eq!(file.checksum, md5_hash(b""));
}

#[tokio::test]
async fn test_ledger_integrity() {
    let h = Harness::new();
    let ledger = h.operator.ledger();

    assert!(matches!(ledger.lookup(""), Err(AccessError::TransactionIdEmpty)));
    assert!(matches!(
        ledger.lookup("nonexistent"),
        Err(AccessError::TransactionNotFound(_))
    ));

    let member = h.admitted().await;
    let path = h.write("sample.txt", SAMPLE);
    let receipt = h.upload(&member, &path).await;

    let record = ledger.lookup(receipt.transaction_id.as_str()).unwrap();
    assert_eq!(&record.owner, member.id());
    assert_eq!(record.group, h.group);
    assert_eq!(record.handle, receipt.handle);
    assert_eq!(record.checksum, md5_hash(SAMPLE));
    assert_eq!(record.extension, ".txt");
    assert_eq!(record.key_version, 1);

    let appended = TransactionRecord::new(
        h.owner.id().clone(),
        h.group.clone(),
        md5_hash(b"x"),
        receipt.handle,
        ".bin".to_string(),
        1,
    );
    let id = ledger.append(appended.clone());
    assert_eq!(ledger.lookup(id.as_str()).unwrap(), appended);
    assert_eq!(ledger.len(), 2);
}

#[test_log::test(tokio::test)]
async fn test_owner_keeps_access_after_revocation() {
    let h = Harness::new();
    let member = h.admitted().await;
    let first = h.write("a.txt", SAMPLE);
    let second = h.write("b.csv", b"id,amount\n1,20\n");
    h.upload(&member, &first).await;
    h.upload(&h.owner, &second).await;

    h.owner
        .remove_member_and_secure_files(&h.operator, &h.group, member.id())
        .await
        .unwrap();

    let files = h.owner.list_files(&h.group).unwrap();
    assert_eq!(files.len(), 2);
    for file in &files {
        assert_eq!(file.key_version, 2);
        let downloaded = h
            .owner
            .download(&h.operator, &h.group, file.transaction_id.as_str())
            .await
            .unwrap();
        let expected = std::fs::read(h.dir.path().join(&file.name)).unwrap();
        assert_eq!(downloaded.plaintext, expected);
    }
}

#[tokio::test]
async fn test_readmitted_member_sees_only_current_files() {
    let h = Harness::new();
    let member = h.admitted().await;
    let path = h.write("sample.txt", SAMPLE);
    let t1 = h.upload(&member, &path).await;

    h.owner
        .remove_member_and_secure_files(&h.operator, &h.group, member.id())
        .await
        .unwrap();
    h.owner
        .add_member_object(&h.operator, &h.group, &member)
        .await
        .unwrap();

    let current = &h.owner.list_files(&h.group).unwrap()[0];
    let file = member
        .download(&h.operator, &h.group, current.transaction_id.as_str())
        .await
        .unwrap();
    assert_eq!(file.plaintext, SAMPLE);

    let stale = member
        .download(&h.operator, &h.group, t1.transaction_id.as_str())
        .await;
    assert!(matches!(stale, Err(AccessError::DecryptionError(_))));
}

#[tokio::test]
async fn test_concurrent_uploads_are_all_recorded() {
    let h = Harness::new();
    let alice = h.admitted().await;
    let bob = h.admitted().await;
    let a = h.write("alice.txt", b"from alice");
    let b = h.write("bob.txt", b"from bob");

    let (ra, rb) = tokio::join!(h.upload(&alice, &a), h.upload(&bob, &b));
    assert_ne!(ra.transaction_id, rb.transaction_id);

    let files = h.owner.list_files(&h.group).unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(h.operator.ledger().transactions_for_group(&h.group).len(), 2);
}

/// Owner O creates G, member M uploads sample.txt as T1, O revokes M.
#[test_log::test(tokio::test)]
async fn test_revocation_walkthrough() {
    let h = Harness::new();
    let m = h.admitted().await;
    let sample = h.write("sample.txt", SAMPLE);
    let t1 = h.upload(&m, &sample).await;

    let report = h
        .owner
        .remove_member_and_secure_files(&h.operator, &h.group, m.id())
        .await
        .unwrap();
    assert!(report.is_complete());

    let stale = m
        .download(&h.operator, &h.group, t1.transaction_id.as_str())
        .await;
    assert!(matches!(stale, Err(AccessError::DecryptionError(_))));

    let new_files = h.owner.list_files(&h.group).unwrap();
    let recovered = h
        .owner
        .download(&h.operator, &h.group, new_files[0].transaction_id.as_str())
        .await
        .unwrap();
    assert_eq!(recovered.plaintext, std::fs::read(&sample).unwrap());

    let out = recovered.save_to(h.dir.path().join("out")).await.unwrap();
    assert_eq!(std::fs::read(out).unwrap(), SAMPLE);
}

//! # Cordon Core
//!
//! Group-based access control over content-addressed storage.
//!
//! This crate provides:
//! - **Membership Registry**: Group key pairs and admitted members' public keys,
//!   and signature-based authorization of every request
//! - **Transaction Ledger**: Append-only record of where each file was placed
//! - **Lazy Revocation**: Member removal followed by group key rotation and
//!   re-encryption of every group file
//! - **Principal Operations**: Upload and download for owners and members
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   GroupOwner / GroupMember (Principal)  │
//! ├─────────────────────────────────────────┤
//! │  Operator: locks │ registry │ ledger    │
//! ├─────────────────────────────────────────┤
//! │   cordon-crypto  │  cordon-blockstore   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cordon_core::{GroupMember, GroupOwner, Operator, Principal};
//!
//! let owner = GroupOwner::new(operator.key_provider())?;
//! let member = GroupMember::new(operator.key_provider())?;
//! let group = owner.create_group(&operator)?;
//! owner.add_member_object(&operator, &group, &member).await?;
//!
//! let receipt = member.upload(&operator, &owner, &group, path).await?;
//! owner.remove_member_and_secure_files(&operator, &group, member.id()).await?;
//! // member.download(&operator, &group, receipt.transaction_id.as_str()) now fails
//! ```

pub mod error;
pub mod group;
pub mod ids;
pub mod ledger;
pub mod locks;
pub mod metadata;
pub mod operator;
pub mod principal;
pub mod registry;
pub mod request;

pub use error::{AccessError, Result};
pub use group::{GroupMembership, RekeyFailure, RotationReport};
pub use ids::{GroupId, PrincipalId, TransactionId};
pub use ledger::Ledger;
pub use locks::GroupLocks;
pub use metadata::{FileRecord, PrincipalRef, Role, TransactionRecord};
pub use operator::Operator;
pub use principal::{DownloadedFile, GroupMember, GroupOwner, Identity, Principal, UploadReceipt};
pub use registry::{AccessProxy, GroupKeyPair, GroupRecord, MemberEntry, RetiredKey, RotationState};
pub use request::{DownloadRequest, UploadRequest};

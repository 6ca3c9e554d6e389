//! # Cordon Blockstore
//!
//! Content-addressed blob storage for the Cordon group storage system.
//!
//! This crate provides:
//! - **Block operations**: Put, get, stat and delete opaque blobs
//! - **CID generation**: Content handles derived from the stored bytes
//! - **Backends**: In-memory storage and the IPFS (Kubo) HTTP API
//!
//! Stored blobs are always ciphertext. The store never sees keys or plaintext,
//! and a handle is only meaningful together with the key that sealed it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Registry / Principal Layer       │
//! ├─────────────────────────────────────────┤
//! │           BlockStore Trait              │
//! ├────────────────────┬────────────────────┤
//! │   IpfsBlockStore   │  MemoryBlockStore  │
//! ├────────────────────┴────────────────────┤
//! │      FlexibleBlockStore (dispatch)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use cordon_blockstore::{BlockStore, MemoryBlockStore};
//!
//! let store = MemoryBlockStore::new();
//! let cid = store.put_block(&ciphertext).await?;
//! let retrieved = store.get_block(&cid).await?;
//! store.delete_block(&cid).await?;
//! ```

pub mod cid_utils;
pub mod error;
pub mod flexible;
pub mod ipfs;
pub mod memory;

pub use cid_utils::{create_cid, parse_cid, CidCodec};
pub use error::{BlockStoreError, Result};
pub use flexible::FlexibleBlockStore;
pub use ipfs::{IpfsBlockStore, IpfsConfig};
pub use memory::MemoryBlockStore;

pub use cid::Cid;

use async_trait::async_trait;
use bytes::Bytes;

/// Default IPFS API endpoint
pub const DEFAULT_IPFS_URL: &str = "http://localhost:5001";

/// Default timeout for a single IPFS request, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for blob storage backends
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Store a block and return its CID
    async fn put_block(&self, data: &[u8]) -> Result<Cid>;

    /// Retrieve a block by CID
    async fn get_block(&self, cid: &Cid) -> Result<Bytes>;

    /// Check if a block exists
    async fn has_block(&self, cid: &Cid) -> Result<bool>;

    /// Delete a block. Deleting an absent block is `NotFound`.
    async fn delete_block(&self, cid: &Cid) -> Result<()>;

    /// Get block size without retrieving content
    async fn block_size(&self, cid: &Cid) -> Result<u64>;
}

//! Backend selection with an in-memory fallback

use crate::{BlockStore, IpfsBlockStore, IpfsConfig, MemoryBlockStore, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use tracing::{info, warn};

/// A block store that is either a real IPFS node or process memory
#[derive(Clone)]
pub enum FlexibleBlockStore {
    /// IPFS node via the HTTP API
    Ipfs(IpfsBlockStore),
    /// In-memory storage (fallback)
    Memory(MemoryBlockStore),
}

impl FlexibleBlockStore {
    /// Connect to IPFS, falling back to memory if the node is unreachable
    pub async fn connect_or_memory(config: IpfsConfig) -> Self {
        let url = config.api_url.clone();
        match IpfsBlockStore::new(config).await {
            Ok(store) => {
                info!(url = %url, "Using IPFS block store");
                Self::Ipfs(store)
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to connect to IPFS, using in-memory storage");
                Self::Memory(MemoryBlockStore::new())
            }
        }
    }

    /// Use in-memory storage only
    pub fn memory() -> Self {
        Self::Memory(MemoryBlockStore::new())
    }

    /// Check if using real IPFS or memory fallback
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Ipfs(_))
    }
}

#[async_trait]
impl BlockStore for FlexibleBlockStore {
    async fn put_block(&self, data: &[u8]) -> Result<Cid> {
        match self {
            Self::Ipfs(store) => store.put_block(data).await,
            Self::Memory(store) => store.put_block(data).await,
        }
    }

    async fn get_block(&self, cid: &Cid) -> Result<Bytes> {
        match self {
            Self::Ipfs(store) => store.get_block(cid).await,
            Self::Memory(store) => store.get_block(cid).await,
        }
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        match self {
            Self::Ipfs(store) => store.has_block(cid).await,
            Self::Memory(store) => store.has_block(cid).await,
        }
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        match self {
            Self::Ipfs(store) => store.delete_block(cid).await,
            Self::Memory(store) => store.delete_block(cid).await,
        }
    }

    async fn block_size(&self, cid: &Cid) -> Result<u64> {
        match self {
            Self::Ipfs(store) => store.block_size(cid).await,
            Self::Memory(store) => store.block_size(cid).await,
        }
    }
}

//! Driver state

use crate::config::CordonConfig;
use cordon_blockstore::FlexibleBlockStore;
use cordon_core::Operator;
use cordon_crypto::RsaKeyProvider;
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a run needs: configuration and the shared operator context
pub struct AppState {
    pub config: CordonConfig,
    pub operator: Operator<FlexibleBlockStore>,
}

impl AppState {
    /// Build the operator over the configured store
    pub async fn new(config: CordonConfig) -> anyhow::Result<Self> {
        config.validate()?;

        let store = if config.use_memory_store {
            info!("Using in-memory block store (data will not persist)");
            FlexibleBlockStore::memory()
        } else {
            FlexibleBlockStore::connect_or_memory(config.ipfs_config()).await
        };
        if !store.is_persistent() {
            warn!("Storage mode: in-memory (NOT persistent)");
        }

        let keys = Arc::new(RsaKeyProvider::new(config.key_bits));
        let operator = Operator::new(Arc::new(store), keys);

        Ok(Self { config, operator })
    }
}

//! Driver configuration

use cordon_blockstore::{IpfsConfig, DEFAULT_IPFS_URL, DEFAULT_TIMEOUT_SECS};
use cordon_crypto::RSA_KEY_BITS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Cordon driver configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CordonConfig {
    /// IPFS API URL
    pub ipfs_url: String,
    /// Use in-memory storage (for testing/development)
    pub use_memory_store: bool,
    /// RSA modulus size for principal and group keys
    pub key_bits: usize,
    /// Per-request IPFS timeout (seconds)
    pub ipfs_timeout_secs: u64,
    /// Where sample and decrypted files are written
    pub output_dir: PathBuf,
}

impl Default for CordonConfig {
    fn default() -> Self {
        Self {
            ipfs_url: DEFAULT_IPFS_URL.to_string(),
            use_memory_store: false,
            key_bits: RSA_KEY_BITS,
            ipfs_timeout_secs: DEFAULT_TIMEOUT_SECS,
            output_dir: PathBuf::from("cordon-output"),
        }
    }
}

impl CordonConfig {
    /// Blob store connection settings
    pub fn ipfs_config(&self) -> IpfsConfig {
        IpfsConfig::with_url(&self.ipfs_url).timeout(Duration::from_secs(self.ipfs_timeout_secs))
    }

    /// Reject settings the key provider cannot work with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.key_bits < 1024 {
            anyhow::bail!("key size {} is too small, use at least 1024 bits", self.key_bits);
        }
        if self.ipfs_timeout_secs == 0 {
            anyhow::bail!("IPFS timeout must be at least one second");
        }
        Ok(())
    }
}

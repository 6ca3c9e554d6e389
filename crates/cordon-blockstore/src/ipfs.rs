//! IPFS HTTP API client for block operations

use crate::{BlockStore, BlockStoreError, Result, DEFAULT_IPFS_URL, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use bytes::Bytes;
use cid::Cid;
use reqwest::{multipart, Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Configuration for IPFS connection
#[derive(Clone, Debug)]
pub struct IpfsConfig {
    /// IPFS API URL (e.g., "http://localhost:5001")
    pub api_url: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_IPFS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl IpfsConfig {
    /// Create with a custom API URL
    pub fn with_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Set the per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// IPFS block store client
#[derive(Clone)]
pub struct IpfsBlockStore {
    client: Client,
    config: IpfsConfig,
}

impl IpfsBlockStore {
    /// Create a new IPFS block store, checking that the node answers
    pub async fn new(config: IpfsConfig) -> Result<Self> {
        if config.api_url.is_empty() {
            return Err(BlockStoreError::Configuration(
                "IPFS API URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlockStoreError::Connection(e.to_string()))?;

        let store = Self { client, config };
        store.verify_connection().await?;

        Ok(store)
    }

    /// Create from URL string
    pub async fn from_url(url: &str) -> Result<Self> {
        Self::new(IpfsConfig::with_url(url)).await
    }

    /// Get the active configuration
    pub fn config(&self) -> &IpfsConfig {
        &self.config
    }

    /// Verify connection to IPFS
    pub async fn verify_connection(&self) -> Result<()> {
        let url = format!("{}/api/v0/id", self.config.api_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| BlockStoreError::Connection(format!("Failed to connect to IPFS: {}", e)))?;

        if !response.status().is_success() {
            return Err(BlockStoreError::Connection(format!(
                "IPFS node answered {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn post(&self, url: &str) -> Result<Response> {
        self.client
            .post(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))
    }

    fn request_error(&self, err: reqwest::Error) -> BlockStoreError {
        BlockStoreError::from_reqwest(err, self.config.timeout.as_secs())
    }

    /// Turn a failed response into `NotFound` or `IpfsApi`
    async fn failure(&self, response: Response, cid: Option<&Cid>, action: &str) -> BlockStoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        match cid {
            Some(cid) if status.as_u16() == 404 || is_not_found(&body) => {
                BlockStoreError::NotFound(*cid)
            }
            _ => BlockStoreError::IpfsApi(format!("Failed to {}: {} {}", action, status, body)),
        }
    }

    /// Put a raw block
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn put_block_raw(&self, data: &[u8]) -> Result<Cid> {
        let url = format!(
            "{}/api/v0/block/put?cid-codec=raw&mhtype=sha2-256&pin=true",
            self.config.api_url,
        );

        let part = multipart::Part::bytes(data.to_vec())
            .file_name("data")
            .mime_str("application/octet-stream")
            .map_err(|e| BlockStoreError::IpfsApi(e.to_string()))?;
        let form = multipart::Form::new().part("data", part);

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            return Err(self.failure(response, None, "put block").await);
        }

        let result: BlockPutResponse = response
            .json()
            .await
            .map_err(|e| BlockStoreError::IpfsApi(e.to_string()))?;

        tracing::debug!(cid = %result.key, size = result.size, "block stored in IPFS");
        crate::cid_utils::parse_cid(&result.key)
    }

    /// Get block by CID
    #[instrument(skip(self))]
    pub async fn get_block_raw(&self, cid: &Cid) -> Result<Bytes> {
        let url = format!("{}/api/v0/block/get?arg={}", self.config.api_url, cid);
        let response = self.post(&url).await?;

        if !response.status().is_success() {
            return Err(self.failure(response, Some(cid), "get block").await);
        }

        response
            .bytes()
            .await
            .map_err(|e| BlockStoreError::IpfsApi(e.to_string()))
    }

    /// Get block stat (size)
    pub async fn block_stat(&self, cid: &Cid) -> Result<BlockStat> {
        let url = format!("{}/api/v0/block/stat?arg={}", self.config.api_url, cid);
        let response = self.post(&url).await?;

        if !response.status().is_success() {
            return Err(self.failure(response, Some(cid), "stat block").await);
        }

        response
            .json()
            .await
            .map_err(|e| BlockStoreError::IpfsApi(e.to_string()))
    }

    /// Unpin and remove a block
    #[instrument(skip(self))]
    pub async fn remove_block(&self, cid: &Cid) -> Result<()> {
        // Blocks are pinned on put, and a pinned block cannot be removed
        let unpin = format!("{}/api/v0/pin/rm?arg={}", self.config.api_url, cid);
        let response = self.post(&unpin).await?;
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(cid = %cid, body = %body, "unpin before removal failed");
        }

        let url = format!("{}/api/v0/block/rm?arg={}", self.config.api_url, cid);
        let response = self.post(&url).await?;

        if !response.status().is_success() {
            return Err(self.failure(response, Some(cid), "remove block").await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| BlockStoreError::IpfsApi(e.to_string()))?;
        // block/rm reports per-block errors inside a 200 response
        if let Ok(removed) = serde_json::from_str::<RemovedBlock>(&body) {
            if let Some(error) = removed.error.filter(|e| !e.is_empty()) {
                if is_not_found(&error) {
                    return Err(BlockStoreError::NotFound(*cid));
                }
                return Err(BlockStoreError::IpfsApi(format!(
                    "Failed to remove block: {}",
                    error
                )));
            }
        }

        Ok(())
    }
}

fn is_not_found(body: &str) -> bool {
    body.to_ascii_lowercase().contains("not found")
}

#[async_trait]
impl BlockStore for IpfsBlockStore {
    async fn put_block(&self, data: &[u8]) -> Result<Cid> {
        self.put_block_raw(data).await
    }

    async fn get_block(&self, cid: &Cid) -> Result<Bytes> {
        self.get_block_raw(cid).await
    }

    async fn has_block(&self, cid: &Cid) -> Result<bool> {
        match self.block_stat(cid).await {
            Ok(_) => Ok(true),
            Err(BlockStoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        self.remove_block(cid).await
    }

    async fn block_size(&self, cid: &Cid) -> Result<u64> {
        let stat = self.block_stat(cid).await?;
        Ok(stat.size)
    }
}

/// Response from /api/v0/block/put
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockPutResponse {
    pub key: String,
    pub size: u64,
}

/// Block statistics
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlockStat {
    pub key: String,
    pub size: u64,
}

/// One entry of the /api/v0/block/rm response stream
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RemovedBlock {
    #[allow(dead_code)]
    hash: String,
    #[serde(default)]
    error: Option<String>,
}

//! CID (Content Identifier) utilities
//!
//! Content handles for stored ciphertext, derived from a BLAKE3 digest

use crate::{BlockStoreError, Result};
use cid::{Cid, Version};
use multihash::Multihash;
use sha2::{Digest, Sha256};

/// Multicodec code for SHA2-256
const SHA2_256: u64 = 0x12;

/// Codecs a content handle may carry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CidCodec {
    /// Raw binary data (0x55)
    #[default]
    Raw,
    /// DAG-PB/Protobuf (0x70), what `ipfs add` produces
    DagPb,
}

impl CidCodec {
    /// Get the multicodec code
    pub fn code(&self) -> u64 {
        match self {
            CidCodec::Raw => 0x55,
            CidCodec::DagPb => 0x70,
        }
    }

    /// Parse from multicodec code
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(CidCodec::Raw),
            0x70 => Some(CidCodec::DagPb),
            _ => None,
        }
    }
}

/// Create a CIDv1 for `data`: SHA2-256 multihash over its BLAKE3 digest
pub fn create_cid(data: &[u8], codec: CidCodec) -> Result<Cid> {
    let hash = blake3::hash(data);
    let digest = Sha256::digest(hash.as_bytes());
    let multihash = Multihash::<64>::wrap(SHA2_256, &digest)
        .map_err(|e| BlockStoreError::InvalidCid(e.to_string()))?;
    Ok(Cid::new_v1(codec.code(), multihash))
}

/// Verify that data matches a locally created CID
pub fn verify_cid(data: &[u8], cid: &Cid) -> bool {
    if cid.version() != Version::V1 {
        return false;
    }
    match CidCodec::from_code(cid.codec()) {
        Some(codec) => create_cid(data, codec).is_ok_and(|expected| expected == *cid),
        None => false,
    }
}

/// Parse a CID from a string
pub fn parse_cid(s: &str) -> Result<Cid> {
    s.parse()
        .map_err(|e: cid::Error| BlockStoreError::InvalidCid(e.to_string()))
}

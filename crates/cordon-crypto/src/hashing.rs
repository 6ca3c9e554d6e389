//! Hashing utilities
//!
//! - SHA-256 digests that feed RSA signatures
//! - MD5 content checksums recorded alongside stored files

use crate::{Result, MAX_READ_BUFFER};
use md5::Md5;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;

/// Size of a SHA-256 digest in bytes
pub const SHA256_BYTE_SIZE: usize = 32;

/// Type alias for SHA-256 digest bytes
pub type Sha256Output = [u8; SHA256_BYTE_SIZE];

/// An incremental SHA-256 hasher
pub struct Sha256Hasher {
    hasher: Sha256,
    bytes_processed: u64,
}

impl Sha256Hasher {
    /// Create a new incremental hasher
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
            bytes_processed: 0,
        }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes_processed += data.len() as u64;
    }

    /// Finalize and return the digest
    pub fn finalize(self) -> Sha256Output {
        self.hasher.finalize().into()
    }

    /// Get the number of bytes processed
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 of an in-memory buffer
pub fn sha256(data: &[u8]) -> Sha256Output {
    Sha256::digest(data).into()
}

/// SHA-256 of a reader, consumed in `MAX_READ_BUFFER` chunks
pub fn sha256_reader<R: Read>(mut reader: R) -> Result<Sha256Output> {
    let mut hasher = Sha256Hasher::new();
    let mut buf = [0u8; MAX_READ_BUFFER];

    loop {
        let n = read_chunk(&mut reader, &mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        if n < buf.len() {
            break;
        }
    }

    Ok(hasher.finalize())
}

/// SHA-256 of a file's contents
pub fn sha256_file(path: impl AsRef<Path>) -> Result<Sha256Output> {
    let file = std::fs::File::open(path)?;
    sha256_reader(file)
}

/// Fill `buf` from `reader`, returning fewer bytes only at end of input.
///
/// A short count always means the stream is exhausted, so callers process the
/// partial chunk and stop.
pub(crate) fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Calculate an MD5 content checksum as lower-case hex
pub fn md5_hash(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Calculate an MD5 checksum incrementally
pub struct Md5Hasher {
    hasher: Md5,
    bytes_processed: u64,
}

impl Md5Hasher {
    pub fn new() -> Self {
        Self {
            hasher: Md5::new(),
            bytes_processed: 0,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.bytes_processed += data.len() as u64;
    }

    pub fn finalize(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }

    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }
}

impl Default for Md5Hasher {
    fn default() -> Self {
        Self::new()
    }
}

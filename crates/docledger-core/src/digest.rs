//! # Content Digests
//!
//! A document is identified by the SHA-256 digest of its raw bytes. Nothing
//! else feeds the hash: filename, metadata, and upload order are irrelevant.
//!
//! ## Wire Form
//!
//! The canonical text form is standard Base64 with padding (44 characters).
//! That exact string is what the ledger stores, what the metadata store
//! indexes, and what clients send. [`ContentDigest::to_hex`] exists for logs.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::FormatError;

/// Read buffer size for streaming hashes.
const CHUNK_SIZE: usize = 64 * 1024;

/// A 32-byte SHA-256 content digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as standard padded Base64, the wire form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Parse the Base64 wire form.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::InvalidDigest`] if the string is not valid
    /// Base64 or does not decode to exactly 32 bytes.
    pub fn from_base64(value: &str) -> Result<Self, FormatError> {
        let decoded = STANDARD
            .decode(value.trim())
            .map_err(|_| FormatError::InvalidDigest(value.to_string()))?;
        let bytes: [u8; 32] = decoded
            .try_into()
            .map_err(|_| FormatError::InvalidDigest(value.to_string()))?;
        Ok(Self(bytes))
    }

    /// Return the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl std::fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentDigest({})", self.to_base64())
    }
}

impl std::str::FromStr for ContentDigest {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base64(&s).map_err(serde::de::Error::custom)
    }
}

/// Hash an in-memory byte slice.
pub fn hash_bytes(data: &[u8]) -> ContentDigest {
    ContentDigest(Sha256::digest(data).into())
}

/// Hash everything readable from `reader`.
///
/// # Errors
///
/// Propagates any read failure. A stream that ends early with an error is
/// never hashed partially.
pub fn hash_reader<R: Read>(mut reader: R) -> std::io::Result<ContentDigest> {
    let mut acc = DigestAccumulator::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        acc.update(&buf[..n]);
    }
    Ok(acc.finalize())
}

/// Incremental SHA-256 for callers that receive content in chunks.
///
/// Produces the same digest as [`hash_bytes`] over the concatenated chunks.
#[derive(Clone, Default)]
pub struct DigestAccumulator {
    hasher: Sha256,
}

impl DigestAccumulator {
    /// Start an empty accumulator.
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Feed the next chunk.
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    /// Consume the accumulator and return the digest.
    pub fn finalize(self) -> ContentDigest {
        ContentDigest(self.hasher.finalize().into())
    }
}

//! Block production
//!
//! A block is raw input, its encoded form, and the CID of the encoded form.

use cid::Cid;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cid_model::cid_from_digest;
use crate::codec::{BlockCodec, Codec, DagCborCodec, RawCodec};
use crate::error::{IpldError, Result};
use crate::hash::{HashFunction, Sha256};

/// A content-addressed block
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Input as supplied by the caller
    pub data: Vec<u8>,
    /// Codec output; this is what the CID addresses
    pub encoded: Vec<u8>,
    pub cid: Cid,
}

impl Block {
    /// Size of the encoded form in bytes
    pub fn size(&self) -> usize {
        self.encoded.len()
    }
}

/// Encodes and addresses blocks using injected codec and hash capabilities
#[derive(Clone)]
pub struct BlockProducer {
    codec: Arc<dyn BlockCodec>,
    hash: Arc<dyn HashFunction>,
}

impl BlockProducer {
    pub fn new(codec: Arc<dyn BlockCodec>, hash: Arc<dyn HashFunction>) -> Self {
        Self { codec, hash }
    }

    /// DAG-CBOR byte-string blocks hashed with sha2-256
    pub fn dag_cbor() -> Self {
        Self::new(Arc::new(DagCborCodec), Arc::new(Sha256))
    }

    /// Raw blocks hashed with sha2-256
    pub fn raw() -> Self {
        Self::new(Arc::new(RawCodec), Arc::new(Sha256))
    }

    /// Producer for a named codec, hashed with sha2-256
    pub fn for_codec(codec: Codec) -> Self {
        Self::new(Arc::from(codec.block_codec()), Arc::new(Sha256))
    }

    pub fn codec(&self) -> Codec {
        self.codec.codec()
    }

    /// Encode `data`, hash the encoded bytes and build a CIDv1
    ///
    /// Encoding and hashing failures are both reported as `BlockCreationFailed`.
    pub fn make_block(&self, data: &[u8]) -> Result<Block> {
        let encoded = self.codec.encode(data).map_err(|e| {
            warn!("Failed to encode {} bytes: {}", data.len(), e);
            IpldError::BlockCreationFailed(e.to_string())
        })?;

        let digest = self.hash.digest(&encoded);
        if digest.len() != self.hash.digest_len() {
            return Err(IpldError::BlockCreationFailed(format!(
                "{} produced {} byte digest, expected {}",
                self.hash.name(),
                digest.len(),
                self.hash.digest_len()
            )));
        }

        let cid = cid_from_digest(self.codec.codec(), self.hash.code(), &digest)
            .map_err(|e| IpldError::BlockCreationFailed(e.to_string()))?;

        debug!(
            "Created {} block {} ({} bytes encoded)",
            self.codec.codec(),
            cid,
            encoded.len()
        );

        Ok(Block {
            data: data.to_vec(),
            encoded,
            cid,
        })
    }
}

impl Default for BlockProducer {
    fn default() -> Self {
        Self::dag_cbor()
    }
}

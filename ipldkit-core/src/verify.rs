//! Whole-buffer CID verification

use cid::Cid;
use futures::Stream;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::cid_model::{cid_from_digest, cids_equal};
use crate::codec::Codec;
use crate::error::{CidField, IpldError, Result};
use crate::hash::{HashFunction, HashRegistry};
use crate::stream_verify::VerifyCidStream;

/// Checks data against claimed CIDs using the hash functions in its registry
#[derive(Clone, Debug)]
pub struct CidVerifier {
    registry: Arc<HashRegistry>,
}

impl CidVerifier {
    pub fn new(registry: Arc<HashRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HashRegistry {
        &self.registry
    }

    /// Recompute the CID of `data` with the hash function and codec declared
    /// by `cid` and compare canonical encodings
    pub fn verify(&self, cid: &Cid, data: &[u8]) -> Result<()> {
        let (codec, hash) = self.resolve(cid)?;
        let computed = cid_from_digest(codec, hash.code(), &hash.digest(data))?;

        if !cids_equal(&computed, cid) {
            warn!("CID mismatch: expected {}, computed {}", cid, computed);
            return Err(IpldError::CidMismatch {
                expected: cid.to_string(),
                actual: computed.to_string(),
            });
        }

        debug!("Verified {} bytes against {}", data.len(), cid);
        Ok(())
    }

    /// Wrap a chunk stream so it is verified against `expected` as it is consumed
    pub fn verify_stream<S, B, E>(&self, source: S, expected: Cid) -> Result<VerifyCidStream<S>>
    where
        S: Stream<Item = std::result::Result<B, E>> + Unpin,
        B: AsRef<[u8]>,
        E: From<IpldError>,
    {
        let (codec, hash) = self.resolve(&expected)?;
        Ok(VerifyCidStream::new(source, expected, codec, hash))
    }

    pub(crate) fn resolve(&self, cid: &Cid) -> Result<(Codec, Arc<dyn HashFunction>)> {
        let codec = Codec::from_code(cid.codec()).ok_or_else(|| {
            IpldError::invalid_cid(
                CidField::Codec,
                "0x55 or 0x71",
                format!("0x{:02x}", cid.codec()),
            )
        })?;
        let hash = self.registry.by_code(cid.hash().code())?;
        Ok((codec, hash))
    }
}

impl Default for CidVerifier {
    fn default() -> Self {
        Self::new(Arc::new(HashRegistry::default()))
    }
}

/// Verify `data` against `cid` with the default hash registry
pub fn verify_cid(cid: &Cid, data: &[u8]) -> Result<()> {
    CidVerifier::default().verify(cid, data)
}

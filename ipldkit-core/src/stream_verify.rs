//! Streaming CID verification
//!
//! [`VerifyCidStream`] sits between a chunk source and its consumer. Each chunk
//! is hashed and handed on as soon as it arrives; when the source ends the
//! running digest is compared with the expected CID. A mismatch is delivered as
//! the final item of the stream. Chunks already yielded are not retracted, so a
//! consumer must treat any error from this stream as invalidating everything it
//! has read through it.
//!
//! The adapter only pulls from the source when it is polled itself, so a slow
//! consumer holds the source back and dropping the adapter stops all hashing.

use cid::Cid;
use futures::stream::FusedStream;
use futures::{ready, Stream};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tracing::{debug, trace, warn};

use crate::cid_model::{cid_from_digest, cids_equal};
use crate::codec::Codec;
use crate::error::{IpldError, Result};
use crate::hash::{HashFunction, HashRegistry, StreamHasher};
use crate::verify::CidVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    /// Forwarding chunks and updating the digest
    Streaming,
    /// Source exhausted, digest being compared
    Finalizing,
    /// Digest matched the expected CID
    Verified,
    /// Digest mismatch or source failure
    Failed,
}

impl VerificationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, VerificationState::Verified | VerificationState::Failed)
    }
}

/// Pass-through stream that verifies its contents against an expected CID
pub struct VerifyCidStream<S> {
    source: S,
    expected: Cid,
    codec: Codec,
    hash: Arc<dyn HashFunction>,
    hasher: Option<Box<dyn StreamHasher>>,
    state: VerificationState,
    bytes_processed: u64,
}

impl<S> VerifyCidStream<S> {
    pub(crate) fn new(
        source: S,
        expected: Cid,
        codec: Codec,
        hash: Arc<dyn HashFunction>,
    ) -> Self {
        let hasher = Some(hash.hasher());
        Self {
            source,
            expected,
            codec,
            hash,
            hasher,
            state: VerificationState::Streaming,
            bytes_processed: 0,
        }
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    pub fn expected_cid(&self) -> &Cid {
        &self.expected
    }

    /// Total bytes forwarded so far
    pub fn bytes_processed(&self) -> u64 {
        self.bytes_processed
    }

    fn fail(&mut self) {
        self.hasher = None;
        self.state = VerificationState::Failed;
    }

    /// Compare the final digest against the expected CID
    fn finalize(&mut self, hasher: Box<dyn StreamHasher>) -> Result<Cid> {
        self.state = VerificationState::Finalizing;

        let digest = hasher.finalize();
        let actual = cid_from_digest(self.codec, self.hash.code(), &digest)?;

        if !cids_equal(&actual, &self.expected) {
            return Err(IpldError::CidMismatch {
                expected: self.expected.to_string(),
                actual: actual.to_string(),
            });
        }

        Ok(actual)
    }
}

impl<S, B, E> Stream for VerifyCidStream<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: From<IpldError>,
{
    type Item = std::result::Result<B, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.state.is_terminal() {
            return Poll::Ready(None);
        }

        match ready!(Pin::new(&mut this.source).poll_next(cx)) {
            Some(Ok(chunk)) => {
                let bytes = chunk.as_ref();
                if let Some(hasher) = this.hasher.as_mut() {
                    hasher.update(bytes);
                }
                this.bytes_processed += bytes.len() as u64;
                trace!("Forwarding {} byte chunk", bytes.len());
                Poll::Ready(Some(Ok(chunk)))
            }
            Some(Err(e)) => {
                debug!(
                    "Source failed after {} bytes while verifying {}",
                    this.bytes_processed, this.expected
                );
                this.fail();
                Poll::Ready(Some(Err(e)))
            }
            None => {
                // Only a failed stream has dropped its hasher
                let Some(hasher) = this.hasher.take() else {
                    this.fail();
                    return Poll::Ready(None);
                };
                match this.finalize(hasher) {
                    Ok(cid) => {
                        this.state = VerificationState::Verified;
                        debug!("Verified {} bytes against {}", this.bytes_processed, cid);
                        Poll::Ready(None)
                    }
                    Err(e) => {
                        warn!("Stream verification failed: {}", e);
                        this.fail();
                        Poll::Ready(Some(Err(E::from(e))))
                    }
                }
            }
        }
    }
}

impl<S, B, E> FusedStream for VerifyCidStream<S>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: From<IpldError>,
{
    fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Verify `source` against `expected` using the hash functions in `registry`
pub fn verify_cid_stream<S, B, E>(
    source: S,
    expected: Cid,
    registry: Arc<HashRegistry>,
) -> Result<VerifyCidStream<S>>
where
    S: Stream<Item = std::result::Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: From<IpldError>,
{
    CidVerifier::new(registry).verify_stream(source, expected)
}

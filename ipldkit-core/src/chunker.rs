//! Fixed-size chunking of async readers
//!
//! Produces the chunk sequence fed to streaming verification.

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Default chunk size: 64KB (64 * 1024 bytes)
pub const DEFAULT_CHUNK_SIZE: usize = 65536;

/// A chunker that reads data from an async reader and splits it into fixed-size chunks
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    eof_reached: bool,
}

impl<R: AsyncRead + Unpin> Chunker<R> {
    /// Create a new chunker with the default chunk size (64KB)
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Create a new chunker with a custom chunk size
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be greater than 0");
        Self {
            reader,
            chunk_size,
            eof_reached: false,
        }
    }

    /// Read the next chunk from the reader
    ///
    /// Returns:
    /// - `Ok(Some(Vec<u8>))` - Next chunk of data (may be smaller than chunk_size at EOF)
    /// - `Ok(None)` - EOF reached, no more data
    /// - `Err(io::Error)` - IO error occurred
    pub async fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        if self.eof_reached {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.chunk_size];
        let mut total_read = 0;

        while total_read < self.chunk_size {
            match self.reader.read(&mut buffer[total_read..]).await? {
                0 => {
                    self.eof_reached = true;
                    if total_read == 0 {
                        return Ok(None);
                    }
                    buffer.truncate(total_read);
                    return Ok(Some(buffer));
                }
                n => {
                    total_read += n;
                }
            }
        }

        Ok(Some(buffer))
    }
}

impl<R: AsyncRead + Unpin + Send + 'static> Chunker<R> {
    /// Turn the chunker into a stream of chunks
    ///
    /// A read error is yielded once and ends the stream.
    pub fn into_stream(self) -> BoxStream<'static, io::Result<Bytes>> {
        stream::unfold(Some(self), |state| async move {
            let mut chunker = state?;
            match chunker.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(Bytes::from(chunk)), Some(chunker))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
        .boxed()
    }
}

impl<R> Chunker<R> {
    /// Get the configured chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Check if EOF has been reached
    pub fn is_eof(&self) -> bool {
        self.eof_reached
    }
}

//! Reads chunked messages from an async byte stream.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::MAX_CHUNK_SIZE;
use crate::error::PackStreamError;

/// Default cap on a reassembled message (16 MiB).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Reads length-prefixed chunked messages from an `AsyncRead` stream.
///
/// Chunks are concatenated until the zero-length terminator; the
/// reassembled message is capped to guard against a runaway peer.
pub struct ChunkReader<R> {
    reader: R,
    buf: BytesMut,
    max_message_size: usize,
}

impl<R: AsyncRead + Unpin> ChunkReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: BytesMut::with_capacity(MAX_CHUNK_SIZE),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads a complete message (all chunks until the `0x0000` terminator).
    pub async fn read_message(&mut self) -> Result<BytesMut, PackStreamError> {
        let mut message = BytesMut::new();

        loop {
            let mut header = [0u8; 2];
            self.reader.read_exact(&mut header).await?;
            let chunk_len = u16::from_be_bytes(header) as usize;

            // A zero-length chunk terminates the message.
            if chunk_len == 0 {
                break;
            }

            if message.len() + chunk_len > self.max_message_size {
                return Err(PackStreamError::Protocol(format!(
                    "chunked message exceeds maximum size of {} bytes",
                    self.max_message_size
                )));
            }

            self.buf.resize(chunk_len, 0);
            self.reader.read_exact(&mut self.buf[..chunk_len]).await?;
            message.extend_from_slice(&self.buf[..chunk_len]);
        }

        tracing::trace!(len = message.len(), "read chunked message");
        Ok(message)
    }
}

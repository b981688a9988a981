//! Writes chunked messages to an async byte stream.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::MAX_CHUNK_SIZE;
use crate::error::PackStreamError;

/// Writes length-prefixed chunked messages to an `AsyncWrite` stream.
pub struct ChunkWriter<W> {
    writer: W,
    max_chunk_size: usize,
}

impl<W: AsyncWrite + Unpin> ChunkWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }

    /// Lowers the chunk size, e.g. to keep individual writes below a
    /// transport MTU. Values are clamped to `1..=65535`.
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Writes a complete message, splitting into chunks of at most
    /// `max_chunk_size` bytes, and appends the `0x0000` terminator.
    pub async fn write_message(&mut self, data: &[u8]) -> Result<(), PackStreamError> {
        let mut chunks = 0usize;
        let mut offset = 0;
        while offset < data.len() {
            let end = (offset + self.max_chunk_size).min(data.len());
            let chunk = &data[offset..end];
            let len = chunk.len() as u16;

            self.writer.write_all(&len.to_be_bytes()).await?;
            self.writer.write_all(chunk).await?;
            offset = end;
            chunks += 1;
        }

        self.writer.write_all(&[0x00, 0x00]).await?;
        tracing::trace!(len = data.len(), chunks, "wrote chunked message");
        Ok(())
    }

    /// Flushes the underlying writer.
    pub async fn flush(&mut self) -> Result<(), PackStreamError> {
        self.writer.flush().await?;
        Ok(())
    }
}

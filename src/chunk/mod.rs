//! Message chunking: 2-byte length-prefixed framing over async streams.
//!
//! A complete encoded message travels as one or more chunks, each a 2-byte
//! big-endian length followed by that many data bytes, terminated by a
//! zero-length chunk. The codec itself is framing-agnostic; this layer is
//! where partially written messages are recovered from.

pub mod reader;
pub mod writer;

pub use reader::ChunkReader;
pub use writer::ChunkWriter;

/// Maximum chunk size (2-byte unsigned length = 65535).
pub(crate) const MAX_CHUNK_SIZE: usize = 65_535;

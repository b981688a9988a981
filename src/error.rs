//! Error types for the PackStream codec.

/// Errors raised by the codec and its chunked transport.
///
/// All codec failures (unknown markers, out-of-range sizes, disabled byte
/// arrays, unencodable values, malformed structure payloads) surface as
/// [`PackStreamError::Protocol`]. The codec performs no partial recovery: a
/// failed encode leaves the channel in an undefined state, a failed decode
/// invalidates the buffer cursor.
#[derive(Debug, thiserror::Error)]
pub enum PackStreamError {
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

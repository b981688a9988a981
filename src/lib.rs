//! PackR — A pure-Rust PackStream v1 binary codec.
//!
//! PackStream is the self-describing binary serialization format used by
//! the Bolt wire protocol of Neo4j and compatible graph databases. Every
//! encoded value starts with a marker byte that either is the value or
//! selects the payload that follows; all multi-byte quantities are
//! big-endian.
//!
//! # Architecture
//!
//! - **`types`** — the [`Value`] sum type, the ordered [`Dict`] map, the
//!   [`Structure`] envelope, and the protocol's record types
//! - **`packer`** — encoding with narrowest-form integer and size-class
//!   dispatch
//! - **`unpacker`** — decoding with a configurable integer policy
//! - **`hooks`** — the hydration/dehydration protocol that assigns
//!   semantics to tagged structures
//! - **`chunk`** — message framing (2-byte length-prefixed chunks)
//!
//! # Example
//!
//! ```
//! use packr::{Packer, Unpacker, Value};
//! use bytes::BytesMut;
//!
//! let mut buf = BytesMut::new();
//! Packer::new(&mut buf).pack(&Value::from("hello")).unwrap();
//! let value = Unpacker::new().unpack(&mut &buf[..]).unwrap();
//! assert_eq!(value, Value::from("hello"));
//! ```

pub mod chunk;
pub mod error;
pub mod hooks;
pub mod marker;
pub mod packer;
pub mod types;
pub mod unpacker;

pub use chunk::{ChunkReader, ChunkWriter};
pub use error::PackStreamError;
pub use hooks::{GraphHooks, Hooks, RawHooks};
pub use packer::Packer;
pub use types::{sig, Dict, Structure, Value};
pub use unpacker::{IntegerMode, Unpacker};

//! PackStream encoding: [`Value`] → bytes.

use bytes::BufMut;

use crate::error::PackStreamError;
use crate::hooks::{Hooks, RawHooks};
use crate::marker;
use crate::types::{Dict, Structure, Value};

/// Upper bound for string, list, map, and byte-array sizes.
const MAX_SIZE: u64 = u32::MAX as u64;

/// Upper bound for structure field counts.
const MAX_STRUCT_FIELDS: usize = 65_535;

/// Encodes values onto a byte channel in PackStream format.
///
/// The packer is stateless apart from the channel reference and the
/// byte-array negotiation flag, and may be reused across messages. Bytes
/// are emitted in strict pre-order: a compound value's header precedes its
/// children, so a failed encode leaves the channel mid-message.
pub struct Packer<B> {
    chan: B,
    byte_arrays_supported: bool,
}

impl<B: BufMut> Packer<B> {
    pub fn new(chan: B) -> Self {
        Self {
            chan,
            byte_arrays_supported: true,
        }
    }

    /// Sets the byte-array negotiation flag. When the peer has negotiated
    /// "no byte arrays", packing a `Bytes` value fails without writing.
    pub fn with_byte_arrays(mut self, supported: bool) -> Self {
        self.byte_arrays_supported = supported;
        self
    }

    pub fn into_inner(self) -> B {
        self.chan
    }

    /// Packs one value with identity hooks: record variants fail to encode.
    pub fn pack(&mut self, value: &Value) -> Result<(), PackStreamError> {
        self.pack_with(value, &RawHooks)
    }

    /// Packs one value, mapping record variants through the dehydration
    /// hook as they are reached in stream order.
    pub fn pack_with(&mut self, value: &Value, hooks: &impl Hooks) -> Result<(), PackStreamError> {
        match value {
            // The missing-value sentinel encodes as NULL wherever a value
            // slot must be filled; map entries drop it instead (see
            // `pack_map`).
            Value::Null | Value::Undefined => {
                self.pack_null();
                Ok(())
            }
            Value::Boolean(b) => {
                self.pack_bool(*b);
                Ok(())
            }
            Value::Integer(i) => {
                self.pack_int(*i);
                Ok(())
            }
            Value::Float(f) => {
                self.pack_float(*f);
                Ok(())
            }
            Value::String(s) => self.pack_string(s),
            Value::Bytes(b) => self.pack_bytes(b),
            Value::List(items) => self.pack_list(items, hooks),
            Value::Map(dict) => self.pack_map(dict, hooks),
            Value::Structure(s) => self.pack_structure(s, hooks),
            record => {
                let dehydrated = hooks.dehydrate(record)?;
                if dehydrated.requires_dehydration() {
                    return Err(PackStreamError::Protocol(format!(
                        "dehydration produced unencodable value of type {}",
                        dehydrated.type_name()
                    )));
                }
                self.pack_with(&dehydrated, hooks)
            }
        }
    }

    pub fn pack_null(&mut self) {
        self.chan.put_u8(marker::NULL);
    }

    pub fn pack_bool(&mut self, value: bool) {
        self.chan
            .put_u8(if value { marker::TRUE } else { marker::FALSE });
    }

    /// Packs an integer using the narrowest form whose range contains it.
    pub fn pack_int(&mut self, value: i64) {
        if (-16..=127).contains(&value) {
            // TINY_INT: the marker byte is the value
            self.chan.put_u8(value as u8);
        } else if i64::from(i8::MIN) <= value && value <= i64::from(i8::MAX) {
            self.chan.put_u8(marker::INT_8);
            self.chan.put_i8(value as i8);
        } else if i64::from(i16::MIN) <= value && value <= i64::from(i16::MAX) {
            self.chan.put_u8(marker::INT_16);
            self.chan.put_i16(value as i16);
        } else if i64::from(i32::MIN) <= value && value <= i64::from(i32::MAX) {
            self.chan.put_u8(marker::INT_32);
            self.chan.put_i32(value as i32);
        } else {
            self.chan.put_u8(marker::INT_64);
            self.chan.put_i64(value);
        }
    }

    pub fn pack_float(&mut self, value: f64) {
        self.chan.put_u8(marker::FLOAT_64);
        self.chan.put_f64(value);
    }

    /// Packs a string (size = byte length, not char count).
    pub fn pack_string(&mut self, value: &str) -> Result<(), PackStreamError> {
        let len = value.len();
        check_size("string", len)?;
        if len <= 15 {
            self.chan.put_u8(marker::TINY_STRING_BASE | len as u8);
        } else if len <= 255 {
            self.chan.put_u8(marker::STRING_8);
            self.chan.put_u8(len as u8);
        } else if len <= 65_535 {
            self.chan.put_u8(marker::STRING_16);
            self.chan.put_u16(len as u16);
        } else {
            self.chan.put_u8(marker::STRING_32);
            self.chan.put_u32(len as u32);
        }
        self.chan.put_slice(value.as_bytes());
        Ok(())
    }

    /// Packs a byte array. There is no tiny form. Fails without writing
    /// when the peer has negotiated "no byte arrays".
    pub fn pack_bytes(&mut self, value: &[u8]) -> Result<(), PackStreamError> {
        if !self.byte_arrays_supported {
            return Err(PackStreamError::Protocol(
                "byte arrays are not supported by this protocol version".into(),
            ));
        }
        let len = value.len();
        check_size("byte array", len)?;
        if len <= 255 {
            self.chan.put_u8(marker::BYTES_8);
            self.chan.put_u8(len as u8);
        } else if len <= 65_535 {
            self.chan.put_u8(marker::BYTES_16);
            self.chan.put_u16(len as u16);
        } else {
            self.chan.put_u8(marker::BYTES_32);
            self.chan.put_u32(len as u32);
        }
        self.chan.put_slice(value);
        Ok(())
    }

    fn pack_list(&mut self, items: &[Value], hooks: &impl Hooks) -> Result<(), PackStreamError> {
        let len = items.len();
        check_size("list", len)?;
        if len <= 15 {
            self.chan.put_u8(marker::TINY_LIST_BASE | len as u8);
        } else if len <= 255 {
            self.chan.put_u8(marker::LIST_8);
            self.chan.put_u8(len as u8);
        } else if len <= 65_535 {
            self.chan.put_u8(marker::LIST_16);
            self.chan.put_u16(len as u16);
        } else {
            self.chan.put_u8(marker::LIST_32);
            self.chan.put_u32(len as u32);
        }
        for item in items {
            self.pack_with(item, hooks)?;
        }
        Ok(())
    }

    /// Packs a map. Entries holding the missing-value sentinel are dropped:
    /// the kept entries are counted first, the header carries that count,
    /// and the pairs follow in their original insertion order.
    fn pack_map(&mut self, dict: &Dict, hooks: &impl Hooks) -> Result<(), PackStreamError> {
        let len = dict
            .iter()
            .filter(|(_, v)| !matches!(v, Value::Undefined))
            .count();
        check_size("map", len)?;
        if len <= 15 {
            self.chan.put_u8(marker::TINY_MAP_BASE | len as u8);
        } else if len <= 255 {
            self.chan.put_u8(marker::MAP_8);
            self.chan.put_u8(len as u8);
        } else if len <= 65_535 {
            self.chan.put_u8(marker::MAP_16);
            self.chan.put_u16(len as u16);
        } else {
            self.chan.put_u8(marker::MAP_32);
            self.chan.put_u32(len as u32);
        }
        for (key, value) in dict {
            if matches!(value, Value::Undefined) {
                continue;
            }
            self.pack_string(key)?;
            self.pack_with(value, hooks)?;
        }
        Ok(())
    }

    fn pack_structure(
        &mut self,
        structure: &Structure,
        hooks: &impl Hooks,
    ) -> Result<(), PackStreamError> {
        let len = structure.len();
        if len <= 15 {
            self.chan.put_u8(marker::TINY_STRUCT_BASE | len as u8);
        } else if len <= 255 {
            self.chan.put_u8(marker::STRUCT_8);
            self.chan.put_u8(len as u8);
        } else if len <= MAX_STRUCT_FIELDS {
            self.chan.put_u8(marker::STRUCT_16);
            self.chan.put_u16(len as u16);
        } else {
            return Err(PackStreamError::Protocol(format!(
                "structure field count {len} exceeds maximum of {MAX_STRUCT_FIELDS}"
            )));
        }
        self.chan.put_u8(structure.signature);
        for field in &structure.fields {
            self.pack_with(field, hooks)?;
        }
        Ok(())
    }
}

fn check_size(what: &str, len: usize) -> Result<(), PackStreamError> {
    if len as u64 > MAX_SIZE {
        return Err(PackStreamError::Protocol(format!(
            "{what} size {len} exceeds maximum of {MAX_SIZE}"
        )));
    }
    Ok(())
}

//! PackStream decoding: bytes → [`Value`].

use bytes::Buf;

use crate::error::PackStreamError;
use crate::hooks::{Hooks, RawHooks};
use crate::marker;
use crate::types::{Dict, Structure, Value};

/// Largest integer magnitude an IEEE 754 double represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// How decoded integers are surfaced to the caller.
///
/// `Exact` keeps the full 64-bit value. `Double` reproduces the behavior of
/// hosts whose natural number type is a double: the value is coerced to
/// `f64`, saturating to negative or positive infinity outside the 53-bit
/// safe range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegerMode {
    #[default]
    Exact,
    Double,
}

/// Decodes values from a byte buffer positioned at a value boundary.
///
/// The unpacker holds only the integer policy and is reused across
/// messages. Each call advances the buffer over exactly one encoded value;
/// a failed decode invalidates the cursor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpacker {
    integer_mode: IntegerMode,
}

impl Unpacker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_integer_mode(mut self, mode: IntegerMode) -> Self {
        self.integer_mode = mode;
        self
    }

    /// Decodes one value with identity hooks: structures pass through raw.
    pub fn unpack(&self, buf: &mut impl Buf) -> Result<Value, PackStreamError> {
        self.unpack_with(buf, &RawHooks)
    }

    /// Decodes one value, offering every decoded structure to the
    /// hydration hook (innermost structures first).
    pub fn unpack_with(
        &self,
        buf: &mut impl Buf,
        hooks: &impl Hooks,
    ) -> Result<Value, PackStreamError> {
        if !buf.has_remaining() {
            return Err(PackStreamError::Protocol("unexpected end of data".into()));
        }

        let m = buf.get_u8();
        match m {
            marker::NULL => Ok(Value::Null),

            marker::FALSE => Ok(Value::Boolean(false)),
            marker::TRUE => Ok(Value::Boolean(true)),

            marker::FLOAT_64 => {
                ensure_remaining(buf, 8)?;
                Ok(Value::Float(buf.get_f64()))
            }

            marker::INT_8 => {
                ensure_remaining(buf, 1)?;
                Ok(self.coerce_int(i64::from(buf.get_i8())))
            }
            marker::INT_16 => {
                ensure_remaining(buf, 2)?;
                Ok(self.coerce_int(i64::from(buf.get_i16())))
            }
            marker::INT_32 => {
                ensure_remaining(buf, 4)?;
                Ok(self.coerce_int(i64::from(buf.get_i32())))
            }
            marker::INT_64 => {
                ensure_remaining(buf, 8)?;
                Ok(self.coerce_int(buf.get_i64()))
            }

            // Byte-array decoding is unconditional; the negotiation flag
            // only constrains the encoder.
            marker::BYTES_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                decode_bytes_data(buf, len)
            }
            marker::BYTES_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                decode_bytes_data(buf, len)
            }
            marker::BYTES_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                decode_bytes_data(buf, len)
            }

            marker::STRING_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                decode_string_data(buf, len)
            }
            marker::STRING_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                decode_string_data(buf, len)
            }
            marker::STRING_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                decode_string_data(buf, len)
            }

            marker::LIST_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                self.decode_list_data(buf, len, hooks)
            }
            marker::LIST_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                self.decode_list_data(buf, len, hooks)
            }
            marker::LIST_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                self.decode_list_data(buf, len, hooks)
            }

            marker::MAP_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                self.decode_map_data(buf, len, hooks)
            }
            marker::MAP_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                self.decode_map_data(buf, len, hooks)
            }
            marker::MAP_32 => {
                ensure_remaining(buf, 4)?;
                let len = buf.get_u32() as usize;
                self.decode_map_data(buf, len, hooks)
            }

            marker::STRUCT_8 => {
                ensure_remaining(buf, 1)?;
                let len = buf.get_u8() as usize;
                self.decode_struct_data(buf, len, hooks)
            }
            marker::STRUCT_16 => {
                ensure_remaining(buf, 2)?;
                let len = buf.get_u16() as usize;
                self.decode_struct_data(buf, len, hooks)
            }

            // Tiny types and the two integer ranges
            _ => {
                let high = m & 0xF0;
                let low = m & 0x0F;

                match high {
                    marker::TINY_STRING_BASE => decode_string_data(buf, low as usize),

                    marker::TINY_LIST_BASE => self.decode_list_data(buf, low as usize, hooks),

                    marker::TINY_MAP_BASE => self.decode_map_data(buf, low as usize, hooks),

                    marker::TINY_STRUCT_BASE => self.decode_struct_data(buf, low as usize, hooks),

                    // Tiny integers: the marker byte is the value, read as
                    // unsigned below 0x80 and as a signed byte above 0xEF.
                    _ if m <= 0x7F => Ok(self.coerce_int(i64::from(m))),
                    _ if m >= 0xF0 => Ok(self.coerce_int(i64::from(m as i8))),

                    _ => Err(PackStreamError::Protocol(format!(
                        "unknown PackStream marker: 0x{m:02X}"
                    ))),
                }
            }
        }
    }

    /// Applies the integer policy to a decoded 64-bit value.
    fn coerce_int(&self, value: i64) -> Value {
        match self.integer_mode {
            IntegerMode::Exact => Value::Integer(value),
            IntegerMode::Double => {
                if value > MAX_SAFE_INTEGER {
                    Value::Float(f64::INFINITY)
                } else if value < -MAX_SAFE_INTEGER {
                    Value::Float(f64::NEG_INFINITY)
                } else {
                    Value::Float(value as f64)
                }
            }
        }
    }

    fn decode_list_data(
        &self,
        buf: &mut impl Buf,
        len: usize,
        hooks: &impl Hooks,
    ) -> Result<Value, PackStreamError> {
        let mut items = Vec::with_capacity(len);
        for _ in 0..len {
            items.push(self.unpack_with(buf, hooks)?);
        }
        Ok(Value::List(items))
    }

    /// Keys are decoded via the same recursive call; a non-string key is
    /// not rejected, its display form is used and decoding continues.
    /// Duplicate keys: last write wins.
    fn decode_map_data(
        &self,
        buf: &mut impl Buf,
        len: usize,
        hooks: &impl Hooks,
    ) -> Result<Value, PackStreamError> {
        let mut dict = Dict::with_capacity(len);
        for _ in 0..len {
            let key = match self.unpack_with(buf, hooks)? {
                Value::String(s) => s,
                other => other.to_string(),
            };
            let value = self.unpack_with(buf, hooks)?;
            dict.insert(key, value);
        }
        Ok(Value::Map(dict))
    }

    /// Size, then one signature byte, then `len` fields. The signature
    /// byte follows the size header in every size class.
    fn decode_struct_data(
        &self,
        buf: &mut impl Buf,
        len: usize,
        hooks: &impl Hooks,
    ) -> Result<Value, PackStreamError> {
        ensure_remaining(buf, 1)?;
        let signature = buf.get_u8();
        let mut fields = Vec::with_capacity(len);
        for _ in 0..len {
            fields.push(self.unpack_with(buf, hooks)?);
        }
        hooks.hydrate(Structure::new(signature, fields))
    }
}

fn ensure_remaining(buf: &impl Buf, needed: usize) -> Result<(), PackStreamError> {
    if buf.remaining() < needed {
        Err(PackStreamError::Protocol(format!(
            "need {needed} bytes but only {} remaining",
            buf.remaining()
        )))
    } else {
        Ok(())
    }
}

fn decode_bytes_data(buf: &mut impl Buf, len: usize) -> Result<Value, PackStreamError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    Ok(Value::Bytes(data))
}

fn decode_string_data(buf: &mut impl Buf, len: usize) -> Result<Value, PackStreamError> {
    ensure_remaining(buf, len)?;
    let mut data = vec![0u8; len];
    buf.copy_to_slice(&mut data);
    let s = String::from_utf8(data)
        .map_err(|e| PackStreamError::Protocol(format!("invalid UTF-8 string: {e}")))?;
    Ok(Value::String(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::GraphHooks;
    use crate::packer::Packer;
    use crate::types::{sig, Date, Node, Path, UnboundRelationship};
    use bytes::BytesMut;

    /// Encode then decode a value and verify round-trip.
    fn round_trip(value: &Value) -> Value {
        let mut buf = BytesMut::new();
        Packer::new(&mut buf).pack(value).expect("pack failed");
        let mut cursor = &buf[..];
        Unpacker::new().unpack(&mut cursor).expect("unpack failed")
    }

    fn unpack_bytes(bytes: &[u8]) -> Result<Value, PackStreamError> {
        Unpacker::new().unpack(&mut &bytes[..])
    }

    #[test]
    fn unpack_null_marker() {
        assert_eq!(unpack_bytes(&[0xC0]).unwrap(), Value::Null);
    }

    #[test]
    fn round_trip_bool() {
        assert_eq!(round_trip(&Value::Boolean(true)), Value::Boolean(true));
        assert_eq!(round_trip(&Value::Boolean(false)), Value::Boolean(false));
    }

    #[test]
    fn round_trip_integers() {
        // TINY_INT boundaries
        for i in [-16, -1, 0, 1, 42, 127] {
            assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i), "failed for {i}");
        }
        // INT_8
        for i in [-128, -17] {
            assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i), "failed for {i}");
        }
        // INT_16
        for i in [-129, 128, -32768, 32767] {
            assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i), "failed for {i}");
        }
        // INT_32
        for i in [-32769, 32768, i64::from(i32::MIN), i64::from(i32::MAX)] {
            assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i), "failed for {i}");
        }
        // INT_64
        for i in [i64::from(i32::MAX) + 1, i64::from(i32::MIN) - 1, i64::MAX, i64::MIN] {
            assert_eq!(round_trip(&Value::Integer(i)), Value::Integer(i), "failed for {i}");
        }
    }

    #[test]
    fn double_mode_coerces_and_saturates() {
        let unpacker = Unpacker::new().with_integer_mode(IntegerMode::Double);
        let cases = [
            (42i64, 42.0),
            (-16, -16.0),
            (MAX_SAFE_INTEGER, MAX_SAFE_INTEGER as f64),
            (-MAX_SAFE_INTEGER, -(MAX_SAFE_INTEGER as f64)),
            (MAX_SAFE_INTEGER + 1, f64::INFINITY),
            (i64::MAX, f64::INFINITY),
            (-MAX_SAFE_INTEGER - 1, f64::NEG_INFINITY),
            (i64::MIN, f64::NEG_INFINITY),
        ];
        for (input, expected) in cases {
            let mut buf = BytesMut::new();
            Packer::new(&mut buf).pack(&Value::Integer(input)).unwrap();
            let decoded = unpacker.unpack(&mut &buf[..]).unwrap();
            assert_eq!(decoded, Value::Float(expected), "failed for {input}");
        }
    }

    #[test]
    fn double_mode_leaves_floats_alone() {
        let unpacker = Unpacker::new().with_integer_mode(IntegerMode::Double);
        let mut buf = BytesMut::new();
        Packer::new(&mut buf).pack(&Value::Float(3.25)).unwrap();
        assert_eq!(unpacker.unpack(&mut &buf[..]).unwrap(), Value::Float(3.25));
    }

    #[test]
    fn round_trip_float() {
        let val = Value::Float(3.14159);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn round_trip_strings() {
        for s in ["", "hello", "größer", &"a".repeat(200), &"b".repeat(70_000)] {
            assert_eq!(round_trip(&Value::from(s)), Value::from(s));
        }
    }

    #[test]
    fn round_trip_bytes() {
        let val = Value::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn round_trip_list() {
        let val = Value::List(vec![
            Value::Integer(1),
            Value::from("two"),
            Value::Boolean(true),
            Value::Null,
        ]);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn round_trip_map_preserves_insertion_order() {
        let val = Value::Map(Dict::from([
            ("name", Value::from("Alice")),
            ("age", Value::Integer(30)),
        ]));
        let decoded = round_trip(&val);
        assert_eq!(decoded, val);
        let keys: Vec<&str> = decoded
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, ["name", "age"]);
    }

    #[test]
    fn round_trip_structure_identity() {
        let s = Structure::new(0x4E, vec![Value::from("a"), Value::Integer(1)]);
        let decoded = round_trip(&Value::Structure(s.clone()));
        assert_eq!(decoded, Value::Structure(s));
    }

    #[test]
    fn round_trip_large_structures() {
        for field_count in [16usize, 256] {
            let s = Structure::new(0x42, vec![Value::Integer(7); field_count]);
            let decoded = round_trip(&Value::Structure(s.clone()));
            assert_eq!(decoded, Value::Structure(s), "failed for {field_count} fields");
        }
    }

    #[test]
    fn duplicate_map_keys_last_write_wins() {
        // A2 {"a": 1, "a": 2}
        let bytes = [0xA2, 0x81, 0x61, 0x01, 0x81, 0x61, 0x02];
        let decoded = unpack_bytes(&bytes).unwrap();
        let dict = decoded.as_map().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get("a"), Some(&Value::Integer(2)));
    }

    #[test]
    fn non_string_map_key_is_tolerated() {
        // A1 {1: 2}
        let bytes = [0xA1, 0x01, 0x02];
        let decoded = unpack_bytes(&bytes).unwrap();
        let dict = decoded.as_map().unwrap();
        assert_eq!(dict.get("1"), Some(&Value::Integer(2)));
    }

    #[test]
    fn unknown_marker_is_reported_in_hex() {
        let err = unpack_bytes(&[0xDF]).unwrap_err();
        assert!(err.to_string().contains("0xDF"), "got: {err}");
    }

    #[test]
    fn truncated_input_is_rejected() {
        assert!(unpack_bytes(&[]).is_err());
        assert!(unpack_bytes(&[0xC1, 0x00]).is_err());
        assert!(unpack_bytes(&[0xD0, 0x05, 0x61]).is_err());
        assert!(unpack_bytes(&[0xB1]).is_err());
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(unpack_bytes(&[0x81, 0xFF]).is_err());
    }

    #[test]
    fn cursor_advances_over_exactly_one_value() {
        let mut buf = BytesMut::new();
        let mut packer = Packer::new(&mut buf);
        packer.pack(&Value::Integer(300)).unwrap();
        packer.pack(&Value::from("next")).unwrap();

        let unpacker = Unpacker::new();
        let mut cursor = &buf[..];
        assert_eq!(unpacker.unpack(&mut cursor).unwrap(), Value::Integer(300));
        assert_eq!(unpacker.unpack(&mut cursor).unwrap(), Value::from("next"));
        assert!(!cursor.has_remaining());
    }

    #[test]
    fn deeply_nested_values_round_trip() {
        let inner = Value::Map(Dict::from([(
            "items",
            Value::List(vec![Value::Integer(1), Value::Integer(2)]),
        )]));
        let val = Value::List(vec![inner.clone(), inner]);
        assert_eq!(round_trip(&val), val);
    }

    #[test]
    fn node_round_trips_through_graph_hooks() {
        let node = Node {
            id: 42,
            labels: vec!["Person".into()],
            properties: Dict::from([("name", Value::from("Alice"))]),
            element_id: "42".into(),
        };

        let mut buf = BytesMut::new();
        Packer::new(&mut buf)
            .pack_with(&Value::Node(node.clone()), &GraphHooks)
            .unwrap();
        let decoded = Unpacker::new()
            .unpack_with(&mut &buf[..], &GraphHooks)
            .unwrap();
        assert_eq!(decoded, Value::Node(node));
    }

    #[test]
    fn path_round_trips_through_graph_hooks() {
        let node = |id: i64| Node {
            id,
            labels: vec!["Stop".into()],
            properties: Dict::new(),
            element_id: id.to_string(),
        };
        let path = Path {
            nodes: vec![node(1), node(2)],
            relationships: vec![UnboundRelationship {
                id: 9,
                rel_type: "NEXT".into(),
                properties: Dict::new(),
                element_id: "9".into(),
            }],
            indices: vec![1, 1],
        };

        let mut buf = BytesMut::new();
        Packer::new(&mut buf)
            .pack_with(&Value::Path(path.clone()), &GraphHooks)
            .unwrap();
        let decoded = Unpacker::new()
            .unpack_with(&mut &buf[..], &GraphHooks)
            .unwrap();
        assert_eq!(decoded, Value::Path(path));
    }

    #[test]
    fn graph_hooks_record_properties_may_nest_records() {
        // A Date inside a node's property map dehydrates in stream order.
        let node = Node {
            id: 1,
            labels: vec![],
            properties: Dict::from([("born", Value::Date(Date { days: 7305 }))]),
            element_id: "1".into(),
        };

        let mut buf = BytesMut::new();
        Packer::new(&mut buf)
            .pack_with(&Value::Node(node.clone()), &GraphHooks)
            .unwrap();
        let decoded = Unpacker::new()
            .unpack_with(&mut &buf[..], &GraphHooks)
            .unwrap();
        assert_eq!(decoded, Value::Node(node));
    }

    #[test]
    fn unknown_signature_survives_graph_hooks() {
        let s = Structure::new(0x7A, vec![Value::Integer(1)]);
        let mut buf = BytesMut::new();
        Packer::new(&mut buf)
            .pack_with(&Value::Structure(s.clone()), &GraphHooks)
            .unwrap();
        let decoded = Unpacker::new()
            .unpack_with(&mut &buf[..], &GraphHooks)
            .unwrap();
        assert_eq!(decoded, Value::Structure(s));
    }

    #[test]
    fn legacy_node_structure_hydrates_with_fallback_element_id() {
        // B3 4E: 3-field node without element_id
        let bytes = [
            0xB3,
            sig::NODE,
            0x07, // id = 7
            0x90, // labels = []
            0xA0, // properties = {}
        ];
        let decoded = Unpacker::new()
            .unpack_with(&mut &bytes[..], &GraphHooks)
            .unwrap();
        let Value::Node(n) = decoded else {
            panic!("expected node");
        };
        assert_eq!(n.id, 7);
        assert_eq!(n.element_id, "7");
    }
}

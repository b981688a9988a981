//! Marker bytes of the wire grammar.
//!
//! Every encoded value leads with exactly one marker byte. A marker either
//! carries the value inline (tiny integers, and the tiny size classes that
//! pack a length into their low nibble) or selects the payload layout that
//! follows. The byte values here are fixed by the protocol; everything in
//! `0x80..=0xEF` belongs to a named family, which is what keeps the two
//! tiny-integer ranges unambiguous.

// One-byte values with no payload, plus the 8-byte float.
pub const NULL: u8 = 0xC0;
pub const FLOAT_64: u8 = 0xC1;
pub const FALSE: u8 = 0xC2;
pub const TRUE: u8 = 0xC3;

// Sized integers, one marker per payload width. Values in -16..=127 use
// no marker at all: the bytes 0x00..=0x7F and 0xF0..=0xFF are themselves
// the value.
pub const INT_8: u8 = 0xC8;
pub const INT_16: u8 = 0xC9;
pub const INT_32: u8 = 0xCA;
pub const INT_64: u8 = 0xCB;

// Sized byte arrays. This is the one family without a tiny form.
pub const BYTES_8: u8 = 0xCC;
pub const BYTES_16: u8 = 0xCD;
pub const BYTES_32: u8 = 0xCE;

// Sized strings, lists, and maps. Sizes under 16 use the tiny forms at
// the bottom of this file; the size unit is bytes for strings, elements
// for lists, entries for maps.
pub const STRING_8: u8 = 0xD0;
pub const STRING_16: u8 = 0xD1;
pub const STRING_32: u8 = 0xD2;

pub const LIST_8: u8 = 0xD4;
pub const LIST_16: u8 = 0xD5;
pub const LIST_32: u8 = 0xD6;

pub const MAP_8: u8 = 0xD8;
pub const MAP_16: u8 = 0xD9;
pub const MAP_32: u8 = 0xDA;

// Sized structures. The signature byte follows the size in both forms;
// field counts stop at 65535, so there is no 32-bit form.
pub const STRUCT_8: u8 = 0xDC;
pub const STRUCT_16: u8 = 0xDD;

// Tiny size classes. The high nibble picks the family and the low nibble
// holds the size 0..=15, so e.g. a three-element list opens with 0x93.
pub const TINY_STRING_BASE: u8 = 0x80;
pub const TINY_LIST_BASE: u8 = 0x90;
pub const TINY_MAP_BASE: u8 = 0xA0;
pub const TINY_STRUCT_BASE: u8 = 0xB0;

//! PackStream value types.

use std::fmt;

/// A string-keyed map with observable insertion order.
///
/// PackStream maps are semantically unordered, but the wire encoding walks
/// entries in insertion order, so the order a caller builds a map in is the
/// order it is emitted in. Keys are unique: inserting an existing key
/// overwrites its value in place without moving the key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, Value)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a key-value pair. An existing key keeps its position and
    /// takes the new value (last write wins).
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (String, Value)> {
        self.entries.iter()
    }
}

impl FromIterator<(String, Value)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (k, v) in iter {
            dict.insert(k, v);
        }
        dict
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Dict {
    fn from(entries: [(&str, Value); N]) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = &'a (String, Value);
    type IntoIter = std::slice::Iter<'a, (String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Dict {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A tagged composite record: a signature byte plus an ordered field list.
///
/// The codec does not interpret the signature; semantics are assigned by
/// the hydration/dehydration hooks that consult the [`sig`](crate::sig)
/// registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub signature: u8,
    pub fields: Vec<Value>,
}

impl Structure {
    pub fn new(signature: u8, fields: Vec<Value>) -> Self {
        Self { signature, fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A PackStream value.
///
/// The first ten variants are the codec's wire domain; the remaining
/// variants are the protocol's record types, which only cross the wire
/// through the hook protocol (see [`Hooks`](crate::Hooks)).
///
/// `Undefined` is the missing-value sentinel, distinct from explicit
/// `Null`: map entries holding it are omitted from the wire, list elements
/// holding it are written as `Null`, and it is never produced by decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(Dict),
    Structure(Structure),
    // Graph records
    Node(Node),
    Relationship(Relationship),
    UnboundRelationship(UnboundRelationship),
    Path(Path),
    // Temporal records
    Date(Date),
    Time(Time),
    LocalTime(LocalTime),
    DateTime(DateTime),
    DateTimeZoneId(DateTimeZoneId),
    LocalDateTime(LocalDateTime),
    Duration(Duration),
    // Spatial records
    Point2D(Point2D),
    Point3D(Point3D),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Dict> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Self::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// The variant name, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Undefined => "Undefined",
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::Bytes(_) => "Bytes",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Structure(_) => "Structure",
            Self::Node(_) => "Node",
            Self::Relationship(_) => "Relationship",
            Self::UnboundRelationship(_) => "UnboundRelationship",
            Self::Path(_) => "Path",
            Self::Date(_) => "Date",
            Self::Time(_) => "Time",
            Self::LocalTime(_) => "LocalTime",
            Self::DateTime(_) => "DateTime",
            Self::DateTimeZoneId(_) => "DateTimeZoneId",
            Self::LocalDateTime(_) => "LocalDateTime",
            Self::Duration(_) => "Duration",
            Self::Point2D(_) => "Point2D",
            Self::Point3D(_) => "Point3D",
        }
    }

    /// Whether this value must pass through a dehydration hook before it
    /// can be written to the wire.
    pub(crate) fn requires_dehydration(&self) -> bool {
        !matches!(
            self,
            Self::Null
                | Self::Undefined
                | Self::Boolean(_)
                | Self::Integer(_)
                | Self::Float(_)
                | Self::String(_)
                | Self::Bytes(_)
                | Self::List(_)
                | Self::Map(_)
                | Self::Structure(_)
        )
    }
}

// -- Structure-borne records --
//
// Everything below travels inside a structure envelope; the codec core
// never touches these directly. `GraphHooks` owns the signature registry
// that maps each record to its envelope and back.

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    /// Stable string identifier carried alongside the numeric id. Peers
    /// that predate it send only the numeric form.
    pub element_id: String,
    pub labels: Vec<String>,
    pub properties: Dict,
}

/// A directed edge between two nodes, with both endpoints resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: i64,
    pub element_id: String,
    pub rel_type: String,
    pub start_node_id: i64,
    pub start_element_id: String,
    pub end_node_id: i64,
    pub end_element_id: String,
    pub properties: Dict,
}

/// A relationship stripped of its endpoints, as it appears inside a path.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundRelationship {
    pub id: i64,
    pub element_id: String,
    pub rel_type: String,
    pub properties: Dict,
}

/// An alternating walk over nodes and relationships.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,
    pub relationships: Vec<UnboundRelationship>,
    /// The walk itself, as alternating relationship and node indices into
    /// the two lists above.
    pub indices: Vec<i64>,
}

/// A calendar date, as a day count from 1970-01-01.
#[derive(Debug, Clone, PartialEq)]
pub struct Date {
    pub days: i64,
}

/// A wall-clock time pinned to a fixed UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub struct Time {
    /// Nanoseconds elapsed since midnight.
    pub nanoseconds: i64,
    /// Offset from UTC, in seconds.
    pub tz_offset_seconds: i64,
}

/// A wall-clock time with no timezone attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTime {
    /// Nanoseconds elapsed since midnight.
    pub nanoseconds: i64,
}

/// An instant pinned to a fixed UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTime {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second remainder.
    pub nanoseconds: i64,
    /// Offset from UTC, in seconds.
    pub tz_offset_seconds: i64,
}

/// An instant in a named timezone.
#[derive(Debug, Clone, PartialEq)]
pub struct DateTimeZoneId {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second remainder.
    pub nanoseconds: i64,
    /// IANA name, e.g. `"Europe/Berlin"`.
    pub tz_id: String,
}

/// An instant with no timezone attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDateTime {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second remainder.
    pub nanoseconds: i64,
}

/// A calendar-aware span of time. Months and days do not reduce to a
/// fixed number of seconds, so all four components travel separately.
#[derive(Debug, Clone, PartialEq)]
pub struct Duration {
    pub months: i64,
    pub days: i64,
    pub seconds: i64,
    pub nanoseconds: i64,
}

/// A point in a two-dimensional coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Point2D {
    /// Spatial reference system identifier.
    pub srid: i64,
    pub x: f64,
    pub y: f64,
}

/// A point in a three-dimensional coordinate reference system.
#[derive(Debug, Clone, PartialEq)]
pub struct Point3D {
    /// Spatial reference system identifier.
    pub srid: i64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// -- Convenience conversions --

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

impl From<Dict> for Value {
    fn from(d: Dict) -> Self {
        Self::Map(d)
    }
}

impl From<Structure> for Value {
    fn from(s: Structure) -> Self {
        Self::Structure(s)
    }
}

impl From<Node> for Value {
    fn from(n: Node) -> Self {
        Self::Node(n)
    }
}

impl From<Relationship> for Value {
    fn from(r: Relationship) -> Self {
        Self::Relationship(r)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Undefined => f.write_str("undefined"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Self::List(items) => {
                f.write_str("[")?;
                let mut sep = "";
                for item in items {
                    write!(f, "{sep}{item}")?;
                    sep = ", ";
                }
                f.write_str("]")
            }
            Self::Map(dict) => {
                f.write_str("{")?;
                let mut sep = "";
                for (k, v) in dict.iter() {
                    write!(f, "{sep}{k}: {v}")?;
                    sep = ", ";
                }
                f.write_str("}")
            }
            Self::Structure(s) => write!(f, "Structure(0x{:02X}, {} fields)", s.signature, s.len()),
            Self::Node(n) => {
                write!(f, "(#{}", n.id)?;
                for label in &n.labels {
                    write!(f, ":{label}")?;
                }
                f.write_str(")")
            }
            Self::Relationship(r) => write!(f, "[#{} {}]", r.id, r.rel_type),
            Self::UnboundRelationship(r) => write!(f, "[#{} {}]", r.id, r.rel_type),
            Self::Path(p) => write!(
                f,
                "path({} nodes, {} relationships)",
                p.nodes.len(),
                p.relationships.len()
            ),
            Self::Date(d) => write!(f, "Date({} days)", d.days),
            Self::Time(t) => write!(f, "Time({}ns {:+}s)", t.nanoseconds, t.tz_offset_seconds),
            Self::LocalTime(t) => write!(f, "LocalTime({}ns)", t.nanoseconds),
            Self::DateTime(dt) => write!(
                f,
                "DateTime({}.{:09} {:+}s)",
                dt.seconds, dt.nanoseconds, dt.tz_offset_seconds
            ),
            Self::DateTimeZoneId(dt) => {
                write!(f, "DateTime({}.{:09} {})", dt.seconds, dt.nanoseconds, dt.tz_id)
            }
            Self::LocalDateTime(dt) => {
                write!(f, "LocalDateTime({}.{:09})", dt.seconds, dt.nanoseconds)
            }
            Self::Duration(d) => write!(
                f,
                "Duration({}mo {}d {}s {}ns)",
                d.months, d.days, d.seconds, d.nanoseconds
            ),
            Self::Point2D(p) => write!(f, "Point({} {} [srid {}])", p.x, p.y, p.srid),
            Self::Point3D(p) => write!(f, "Point({} {} {} [srid {}])", p.x, p.y, p.z, p.srid),
        }
    }
}

//! The hydration/dehydration hook protocol.
//!
//! Structures carry application-defined record types across the wire. The
//! codec itself never interprets a signature byte; instead, every decoded
//! [`Structure`] is offered to a hydration hook, and every application
//! value reaching the packer is first mapped to a codec-recognized value by
//! a dehydration hook. The two hooks travel together as one capability
//! object, passed explicitly into each codec call.

use std::vec;

use crate::error::PackStreamError;
use crate::types::{
    sig, Date, DateTime, DateTimeZoneId, Dict, Duration, LocalDateTime, LocalTime, Node, Path,
    Point2D, Point3D, Relationship, Structure, Time, UnboundRelationship, Value,
};

/// A dehydrate/hydrate capability pair.
///
/// Both methods default to identity behavior: structures pass through
/// untouched on decode, and application values fail to encode (there is
/// nothing the codec could write for them without a translation).
pub trait Hooks {
    /// Maps an application value to a codec-recognized value.
    ///
    /// Called once per application value the packer reaches, in stream
    /// order. The result must be a wire value, usually a [`Structure`].
    fn dehydrate(&self, value: &Value) -> Result<Value, PackStreamError> {
        Err(PackStreamError::Protocol(format!(
            "cannot encode value of type {}",
            value.type_name()
        )))
    }

    /// Maps a decoded structure to an application value.
    ///
    /// Called once per decoded structure, innermost first. May return a
    /// domain value or propagate the raw structure.
    fn hydrate(&self, structure: Structure) -> Result<Value, PackStreamError> {
        Ok(Value::Structure(structure))
    }
}

/// The identity pair: structures in, structures out.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawHooks;

impl Hooks for RawHooks {}

/// The protocol's signature registry: graph, temporal, and spatial records.
///
/// Unknown signatures propagate as raw structures, so a peer may introduce
/// new record types without breaking decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphHooks;

impl Hooks for GraphHooks {
    fn dehydrate(&self, value: &Value) -> Result<Value, PackStreamError> {
        let structure = match value {
            Value::Node(n) => dehydrate_node(n),
            Value::Relationship(r) => dehydrate_relationship(r),
            Value::UnboundRelationship(r) => dehydrate_unbound_relationship(r),
            Value::Path(p) => dehydrate_path(p),
            Value::Date(d) => Structure::new(sig::DATE, vec![Value::Integer(d.days)]),
            Value::Time(t) => Structure::new(
                sig::TIME,
                vec![
                    Value::Integer(t.nanoseconds),
                    Value::Integer(t.tz_offset_seconds),
                ],
            ),
            Value::LocalTime(t) => {
                Structure::new(sig::LOCAL_TIME, vec![Value::Integer(t.nanoseconds)])
            }
            Value::DateTime(dt) => Structure::new(
                sig::DATE_TIME,
                vec![
                    Value::Integer(dt.seconds),
                    Value::Integer(dt.nanoseconds),
                    Value::Integer(dt.tz_offset_seconds),
                ],
            ),
            Value::DateTimeZoneId(dt) => Structure::new(
                sig::DATE_TIME_ZONE_ID,
                vec![
                    Value::Integer(dt.seconds),
                    Value::Integer(dt.nanoseconds),
                    Value::String(dt.tz_id.clone()),
                ],
            ),
            Value::LocalDateTime(dt) => Structure::new(
                sig::LOCAL_DATE_TIME,
                vec![Value::Integer(dt.seconds), Value::Integer(dt.nanoseconds)],
            ),
            Value::Duration(d) => Structure::new(
                sig::DURATION,
                vec![
                    Value::Integer(d.months),
                    Value::Integer(d.days),
                    Value::Integer(d.seconds),
                    Value::Integer(d.nanoseconds),
                ],
            ),
            Value::Point2D(p) => Structure::new(
                sig::POINT_2D,
                vec![Value::Integer(p.srid), Value::Float(p.x), Value::Float(p.y)],
            ),
            Value::Point3D(p) => Structure::new(
                sig::POINT_3D,
                vec![
                    Value::Integer(p.srid),
                    Value::Float(p.x),
                    Value::Float(p.y),
                    Value::Float(p.z),
                ],
            ),
            other => {
                return Err(PackStreamError::Protocol(format!(
                    "cannot encode value of type {}",
                    other.type_name()
                )));
            }
        };
        Ok(Value::Structure(structure))
    }

    fn hydrate(&self, structure: Structure) -> Result<Value, PackStreamError> {
        match structure.signature {
            sig::NODE => hydrate_node(structure.fields),
            sig::RELATIONSHIP => hydrate_relationship(structure.fields),
            sig::UNBOUND_RELATIONSHIP => hydrate_unbound_relationship(structure.fields),
            sig::PATH => hydrate_path(structure.fields),
            sig::DATE => hydrate_date(structure.fields),
            sig::TIME => hydrate_time(structure.fields),
            sig::LOCAL_TIME => hydrate_local_time(structure.fields),
            sig::DATE_TIME => hydrate_datetime(structure.fields),
            sig::DATE_TIME_ZONE_ID => hydrate_datetime_zone_id(structure.fields),
            sig::LOCAL_DATE_TIME => hydrate_local_datetime(structure.fields),
            sig::DURATION => hydrate_duration(structure.fields),
            sig::POINT_2D => hydrate_point2d(structure.fields),
            sig::POINT_3D => hydrate_point3d(structure.fields),
            _ => Ok(Value::Structure(structure)),
        }
    }
}

// -- Dehydration: record → structure envelope --

fn dehydrate_node(n: &Node) -> Structure {
    Structure::new(
        sig::NODE,
        vec![
            Value::Integer(n.id),
            Value::List(n.labels.iter().map(|l| Value::String(l.clone())).collect()),
            Value::Map(n.properties.clone()),
            Value::String(n.element_id.clone()),
        ],
    )
}

fn dehydrate_relationship(r: &Relationship) -> Structure {
    Structure::new(
        sig::RELATIONSHIP,
        vec![
            Value::Integer(r.id),
            Value::Integer(r.start_node_id),
            Value::Integer(r.end_node_id),
            Value::String(r.rel_type.clone()),
            Value::Map(r.properties.clone()),
            Value::String(r.element_id.clone()),
            Value::String(r.start_element_id.clone()),
            Value::String(r.end_element_id.clone()),
        ],
    )
}

fn dehydrate_unbound_relationship(r: &UnboundRelationship) -> Structure {
    Structure::new(
        sig::UNBOUND_RELATIONSHIP,
        vec![
            Value::Integer(r.id),
            Value::String(r.rel_type.clone()),
            Value::Map(r.properties.clone()),
            Value::String(r.element_id.clone()),
        ],
    )
}

// Nested nodes and relationships stay as record variants here; the packer
// dehydrates each one when it reaches it in stream order.
fn dehydrate_path(p: &Path) -> Structure {
    Structure::new(
        sig::PATH,
        vec![
            Value::List(p.nodes.iter().cloned().map(Value::Node).collect()),
            Value::List(
                p.relationships
                    .iter()
                    .cloned()
                    .map(Value::UnboundRelationship)
                    .collect(),
            ),
            Value::List(p.indices.iter().map(|&i| Value::Integer(i)).collect()),
        ],
    )
}

// -- Hydration: structure fields → record --

fn hydrate_node(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    // 4 fields with element_id, 3 in the legacy form.
    let field_count = fields.len();
    if field_count < 3 {
        return Err(PackStreamError::Protocol(format!(
            "Node structure requires at least 3 fields, got {field_count}"
        )));
    }
    let mut fields = fields.into_iter();
    let id = require_int(next_field(&mut fields)?)?;
    let labels = require_string_list(next_field(&mut fields)?)?;
    let properties = require_dict(next_field(&mut fields)?)?;
    let element_id = if field_count >= 4 {
        require_string(next_field(&mut fields)?)?
    } else {
        id.to_string()
    };
    Ok(Value::Node(Node {
        id,
        labels,
        properties,
        element_id,
    }))
}

fn hydrate_relationship(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    // 8 fields with element ids, 5 in the legacy form.
    let field_count = fields.len();
    if field_count < 5 {
        return Err(PackStreamError::Protocol(format!(
            "Relationship structure requires at least 5 fields, got {field_count}"
        )));
    }
    let mut fields = fields.into_iter();
    let id = require_int(next_field(&mut fields)?)?;
    let start_node_id = require_int(next_field(&mut fields)?)?;
    let end_node_id = require_int(next_field(&mut fields)?)?;
    let rel_type = require_string(next_field(&mut fields)?)?;
    let properties = require_dict(next_field(&mut fields)?)?;
    let (element_id, start_element_id, end_element_id) = if field_count >= 8 {
        (
            require_string(next_field(&mut fields)?)?,
            require_string(next_field(&mut fields)?)?,
            require_string(next_field(&mut fields)?)?,
        )
    } else {
        (
            id.to_string(),
            start_node_id.to_string(),
            end_node_id.to_string(),
        )
    };
    Ok(Value::Relationship(Relationship {
        id,
        start_node_id,
        end_node_id,
        rel_type,
        properties,
        element_id,
        start_element_id,
        end_element_id,
    }))
}

fn hydrate_unbound_relationship(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let field_count = fields.len();
    if field_count < 3 {
        return Err(PackStreamError::Protocol(format!(
            "UnboundRelationship structure requires at least 3 fields, got {field_count}"
        )));
    }
    let mut fields = fields.into_iter();
    let id = require_int(next_field(&mut fields)?)?;
    let rel_type = require_string(next_field(&mut fields)?)?;
    let properties = require_dict(next_field(&mut fields)?)?;
    let element_id = if field_count >= 4 {
        require_string(next_field(&mut fields)?)?
    } else {
        id.to_string()
    };
    Ok(Value::UnboundRelationship(UnboundRelationship {
        id,
        rel_type,
        properties,
        element_id,
    }))
}

fn hydrate_path(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    if fields.len() < 3 {
        return Err(PackStreamError::Protocol(format!(
            "Path structure requires 3 fields, got {}",
            fields.len()
        )));
    }
    let mut fields = fields.into_iter();

    let nodes = match next_field(&mut fields)? {
        Value::List(items) => items
            .into_iter()
            .map(|v| match v {
                Value::Node(n) => Ok(n),
                other => Err(PackStreamError::Protocol(format!(
                    "path nodes must be Node, got: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(PackStreamError::Protocol("path nodes must be a list".into())),
    };

    let relationships = match next_field(&mut fields)? {
        Value::List(items) => items
            .into_iter()
            .map(|v| match v {
                Value::UnboundRelationship(r) => Ok(r),
                other => Err(PackStreamError::Protocol(format!(
                    "path relationships must be UnboundRelationship, got: {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(PackStreamError::Protocol(
                "path relationships must be a list".into(),
            ));
        }
    };

    let indices = match next_field(&mut fields)? {
        Value::List(items) => items
            .into_iter()
            .map(require_int)
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(PackStreamError::Protocol(
                "path indices must be a list".into(),
            ));
        }
    };

    Ok(Value::Path(Path {
        nodes,
        relationships,
        indices,
    }))
}

fn hydrate_date(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 1, "Date")?;
    let days = require_int(next_field(&mut fields)?)?;
    Ok(Value::Date(Date { days }))
}

fn hydrate_time(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 2, "Time")?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    let tz_offset_seconds = require_int(next_field(&mut fields)?)?;
    Ok(Value::Time(Time {
        nanoseconds,
        tz_offset_seconds,
    }))
}

fn hydrate_local_time(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 1, "LocalTime")?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    Ok(Value::LocalTime(LocalTime { nanoseconds }))
}

fn hydrate_datetime(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 3, "DateTime")?;
    let seconds = require_int(next_field(&mut fields)?)?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    let tz_offset_seconds = require_int(next_field(&mut fields)?)?;
    Ok(Value::DateTime(DateTime {
        seconds,
        nanoseconds,
        tz_offset_seconds,
    }))
}

fn hydrate_datetime_zone_id(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 3, "DateTimeZoneId")?;
    let seconds = require_int(next_field(&mut fields)?)?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    let tz_id = require_string(next_field(&mut fields)?)?;
    Ok(Value::DateTimeZoneId(DateTimeZoneId {
        seconds,
        nanoseconds,
        tz_id,
    }))
}

fn hydrate_local_datetime(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 2, "LocalDateTime")?;
    let seconds = require_int(next_field(&mut fields)?)?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    Ok(Value::LocalDateTime(LocalDateTime {
        seconds,
        nanoseconds,
    }))
}

fn hydrate_duration(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 4, "Duration")?;
    let months = require_int(next_field(&mut fields)?)?;
    let days = require_int(next_field(&mut fields)?)?;
    let seconds = require_int(next_field(&mut fields)?)?;
    let nanoseconds = require_int(next_field(&mut fields)?)?;
    Ok(Value::Duration(Duration {
        months,
        days,
        seconds,
        nanoseconds,
    }))
}

fn hydrate_point2d(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 3, "Point2D")?;
    let srid = require_int(next_field(&mut fields)?)?;
    let x = require_float(next_field(&mut fields)?)?;
    let y = require_float(next_field(&mut fields)?)?;
    Ok(Value::Point2D(Point2D { srid, x, y }))
}

fn hydrate_point3d(fields: Vec<Value>) -> Result<Value, PackStreamError> {
    let mut fields = require_fields(fields, 4, "Point3D")?;
    let srid = require_int(next_field(&mut fields)?)?;
    let x = require_float(next_field(&mut fields)?)?;
    let y = require_float(next_field(&mut fields)?)?;
    let z = require_float(next_field(&mut fields)?)?;
    Ok(Value::Point3D(Point3D { srid, x, y, z }))
}

// -- Field extraction helpers --

fn require_fields(
    fields: Vec<Value>,
    count: usize,
    what: &str,
) -> Result<vec::IntoIter<Value>, PackStreamError> {
    if fields.len() < count {
        return Err(PackStreamError::Protocol(format!(
            "{what} structure requires {count} fields, got {}",
            fields.len()
        )));
    }
    Ok(fields.into_iter())
}

fn next_field(fields: &mut vec::IntoIter<Value>) -> Result<Value, PackStreamError> {
    fields
        .next()
        .ok_or_else(|| PackStreamError::Protocol("structure field missing".into()))
}

fn require_int(v: Value) -> Result<i64, PackStreamError> {
    match v {
        Value::Integer(i) => Ok(i),
        other => Err(PackStreamError::Protocol(format!(
            "expected integer, got: {other}"
        ))),
    }
}

fn require_float(v: Value) -> Result<f64, PackStreamError> {
    match v {
        Value::Float(f) => Ok(f),
        other => Err(PackStreamError::Protocol(format!(
            "expected float, got: {other}"
        ))),
    }
}

fn require_string(v: Value) -> Result<String, PackStreamError> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(PackStreamError::Protocol(format!(
            "expected string, got: {other}"
        ))),
    }
}

fn require_dict(v: Value) -> Result<Dict, PackStreamError> {
    match v {
        Value::Map(d) => Ok(d),
        other => Err(PackStreamError::Protocol(format!(
            "expected map, got: {other}"
        ))),
    }
}

fn require_string_list(v: Value) -> Result<Vec<String>, PackStreamError> {
    match v {
        Value::List(items) => items.into_iter().map(require_string).collect(),
        other => Err(PackStreamError::Protocol(format!(
            "expected string list, got: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_node() -> Node {
        Node {
            id: 42,
            labels: vec!["Person".into()],
            properties: Dict::from([("name", Value::from("Alice"))]),
            element_id: "42".into(),
        }
    }

    #[test]
    fn default_dehydrate_rejects_records() {
        let err = RawHooks
            .dehydrate(&Value::Node(sample_node()))
            .unwrap_err();
        assert!(err.to_string().contains("Node"));
    }

    #[test]
    fn default_hydrate_passes_structures_through() {
        let s = Structure::new(0x77, vec![Value::Integer(1)]);
        let v = RawHooks.hydrate(s.clone()).unwrap();
        assert_eq!(v, Value::Structure(s));
    }

    #[test]
    fn node_dehydrates_to_four_field_structure() {
        let v = GraphHooks.dehydrate(&Value::Node(sample_node())).unwrap();
        let s = v.as_structure().unwrap();
        assert_eq!(s.signature, sig::NODE);
        assert_eq!(s.len(), 4);
        assert_eq!(s.fields[0], Value::Integer(42));
        assert_eq!(s.fields[3], Value::from("42"));
    }

    #[test]
    fn node_round_trips_through_hooks() {
        let node = sample_node();
        let dehydrated = GraphHooks.dehydrate(&Value::Node(node.clone())).unwrap();
        let Value::Structure(s) = dehydrated else {
            panic!("expected structure");
        };
        assert_eq!(GraphHooks.hydrate(s).unwrap(), Value::Node(node));
    }

    #[test]
    fn legacy_node_falls_back_to_numeric_element_id() {
        let s = Structure::new(
            sig::NODE,
            vec![
                Value::Integer(7),
                Value::List(vec![]),
                Value::Map(Dict::new()),
            ],
        );
        let Value::Node(n) = GraphHooks.hydrate(s).unwrap() else {
            panic!("expected node");
        };
        assert_eq!(n.element_id, "7");
    }

    #[test]
    fn legacy_relationship_falls_back_to_numeric_element_ids() {
        let s = Structure::new(
            sig::RELATIONSHIP,
            vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
                Value::from("KNOWS"),
                Value::Map(Dict::new()),
            ],
        );
        let Value::Relationship(r) = GraphHooks.hydrate(s).unwrap() else {
            panic!("expected relationship");
        };
        assert_eq!(r.element_id, "1");
        assert_eq!(r.start_element_id, "2");
        assert_eq!(r.end_element_id, "3");
    }

    #[test]
    fn unknown_signature_passes_through() {
        let s = Structure::new(0x7A, vec![Value::Boolean(true)]);
        assert_eq!(
            GraphHooks.hydrate(s.clone()).unwrap(),
            Value::Structure(s)
        );
    }

    #[test]
    fn malformed_node_payload_is_rejected() {
        let s = Structure::new(
            sig::NODE,
            vec![
                Value::from("not an id"),
                Value::List(vec![]),
                Value::Map(Dict::new()),
            ],
        );
        assert!(GraphHooks.hydrate(s).is_err());

        let too_short = Structure::new(sig::NODE, vec![Value::Integer(1)]);
        assert!(GraphHooks.hydrate(too_short).is_err());
    }

    #[test]
    fn temporal_records_round_trip_through_hooks() {
        let values = [
            Value::Date(Date { days: 19000 }),
            Value::Time(Time {
                nanoseconds: 1234,
                tz_offset_seconds: 3600,
            }),
            Value::LocalTime(LocalTime { nanoseconds: 5 }),
            Value::DateTime(DateTime {
                seconds: 1_600_000_000,
                nanoseconds: 999,
                tz_offset_seconds: -7200,
            }),
            Value::DateTimeZoneId(DateTimeZoneId {
                seconds: 1_600_000_000,
                nanoseconds: 1,
                tz_id: "Europe/Stockholm".into(),
            }),
            Value::LocalDateTime(LocalDateTime {
                seconds: 1,
                nanoseconds: 2,
            }),
            Value::Duration(Duration {
                months: 12,
                days: 30,
                seconds: 3600,
                nanoseconds: 500,
            }),
        ];
        for value in values {
            let Value::Structure(s) = GraphHooks.dehydrate(&value).unwrap() else {
                panic!("expected structure");
            };
            assert_eq!(GraphHooks.hydrate(s).unwrap(), value);
        }
    }

    #[test]
    fn spatial_records_round_trip_through_hooks() {
        for value in [
            Value::Point2D(Point2D {
                srid: 4326,
                x: 12.5,
                y: 55.7,
            }),
            Value::Point3D(Point3D {
                srid: 4979,
                x: 1.0,
                y: 2.0,
                z: 3.0,
            }),
        ] {
            let Value::Structure(s) = GraphHooks.dehydrate(&value).unwrap() else {
                panic!("expected structure");
            };
            assert_eq!(GraphHooks.hydrate(s).unwrap(), value);
        }
    }
}

//! PackStream value types, the structure envelope, and protocol records.

mod value;

pub use value::{
    Date, DateTime, DateTimeZoneId, Dict, Duration, LocalDateTime, LocalTime, Node, Path, Point2D,
    Point3D, Relationship, Structure, Time, UnboundRelationship, Value,
};

/// Structure signature bytes for the protocol's record types.
pub mod sig {
    pub const NODE: u8 = 0x4E;
    pub const RELATIONSHIP: u8 = 0x52;
    pub const UNBOUND_RELATIONSHIP: u8 = 0x72;
    pub const PATH: u8 = 0x50;
    pub const DATE: u8 = 0x44;
    pub const TIME: u8 = 0x54;
    pub const LOCAL_TIME: u8 = 0x74;
    pub const DATE_TIME: u8 = 0x49;
    pub const DATE_TIME_ZONE_ID: u8 = 0x69;
    pub const LOCAL_DATE_TIME: u8 = 0x64;
    pub const DURATION: u8 = 0x45;
    pub const POINT_2D: u8 = 0x58;
    pub const POINT_3D: u8 = 0x59;
}

//! Core data types for the positioning engine

use serde::{Deserialize, Serialize};

use crate::core::constants::{ANCHOR_TYPE_CODE, TAG_TYPE_CODE};

/// Stable device identifier as stored in the device table
pub type DeviceId = i64;

/// Planar position in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Role of a device in the positioning system.
///
/// Serialized as `"anchor"` / `"tag"`; the numeric codes of older device
/// tables (1 = anchor, 2 = tag) are accepted when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "KindRepr")]
pub enum DeviceKind {
    /// Reference node with externally configured coordinates
    Anchor,
    /// Mobile node whose coordinates this engine owns
    Tag,
}

impl DeviceKind {
    /// Map the numeric type code used by older device tables
    pub fn from_type_code(code: u8) -> Option<Self> {
        match code {
            ANCHOR_TYPE_CODE => Some(DeviceKind::Anchor),
            TAG_TYPE_CODE => Some(DeviceKind::Tag),
            _ => None,
        }
    }

    pub fn type_code(self) -> u8 {
        match self {
            DeviceKind::Anchor => ANCHOR_TYPE_CODE,
            DeviceKind::Tag => TAG_TYPE_CODE,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KindRepr {
    Name(String),
    Code(u8),
}

impl TryFrom<KindRepr> for DeviceKind {
    type Error = String;

    fn try_from(repr: KindRepr) -> Result<Self, Self::Error> {
        match repr {
            KindRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "anchor" => Ok(DeviceKind::Anchor),
                "tag" => Ok(DeviceKind::Tag),
                _ => Err(format!("unknown device kind '{}'", name)),
            },
            KindRepr::Code(code) => {
                DeviceKind::from_type_code(code).ok_or_else(|| format!("unknown device type code {}", code))
            }
        }
    }
}

/// One row of the device table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub mac: String,
    pub kind: DeviceKind,
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
}

impl Device {
    pub fn anchor(id: DeviceId, mac: impl Into<String>, position: Point2) -> Self {
        Self {
            id,
            mac: mac.into(),
            kind: DeviceKind::Anchor,
            position_x: Some(position.x),
            position_y: Some(position.y),
        }
    }

    /// A tag that has not been located yet
    pub fn tag(id: DeviceId, mac: impl Into<String>) -> Self {
        Self {
            id,
            mac: mac.into(),
            kind: DeviceKind::Tag,
            position_x: None,
            position_y: None,
        }
    }

    pub fn is_anchor(&self) -> bool {
        self.kind == DeviceKind::Anchor
    }

    pub fn is_tag(&self) -> bool {
        self.kind == DeviceKind::Tag
    }

    /// Known position, only when both coordinates are present
    pub fn position(&self) -> Option<Point2> {
        match (self.position_x, self.position_y) {
            (Some(x), Some(y)) => Some(Point2::new(x, y)),
            _ => None,
        }
    }

    pub fn set_position(&mut self, position: Point2) {
        self.position_x = Some(position.x);
        self.position_y = Some(position.y);
    }
}

/// Raw range sample row as read from storage; any column may be null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeSampleRow {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub source_id: Option<DeviceId>,
    #[serde(default)]
    pub dest_id: Option<DeviceId>,
    #[serde(default)]
    pub distance_cm: Option<f64>,
    #[serde(default)]
    pub rtt_ns: Option<f64>,
}

impl RangeSampleRow {
    pub fn new(id: i64, source_id: DeviceId, dest_id: DeviceId, distance_cm: f64) -> Self {
        Self {
            id: Some(id),
            source_id: Some(source_id),
            dest_id: Some(dest_id),
            distance_cm: Some(distance_cm),
            rtt_ns: None,
        }
    }

    pub fn with_rtt(mut self, rtt_ns: f64) -> Self {
        self.rtt_ns = Some(rtt_ns);
        self
    }
}

/// Complete range measurement between a tag (source) and an anchor (destination)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    pub id: i64,
    pub source_id: DeviceId,
    pub dest_id: DeviceId,
    pub distance_cm: f64,
    pub rtt_ns: Option<f64>,
}

/// Estimated position of one tag for a single cycle.
///
/// Undetermined estimates carry NaN coordinates so a single finiteness check
/// decides whether the estimate may be stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimate {
    pub tag_id: DeviceId,
    pub x: f64,
    pub y: f64,
}

impl PositionEstimate {
    pub fn new(tag_id: DeviceId, x: f64, y: f64) -> Self {
        Self { tag_id, x, y }
    }

    pub fn undetermined(tag_id: DeviceId) -> Self {
        Self {
            tag_id,
            x: f64::NAN,
            y: f64::NAN,
        }
    }

    pub fn is_determined(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn point(&self) -> Option<Point2> {
        self.is_determined().then(|| Point2::new(self.x, self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_requires_both_coordinates() {
        let mut tag = Device::tag(4, "00:11:22:33:44:04");
        assert_eq!(tag.position(), None);

        tag.position_x = Some(1.0);
        assert_eq!(tag.position(), None);

        tag.set_position(Point2::new(2.0, 3.0));
        assert_eq!(tag.position(), Some(Point2::new(2.0, 3.0)));
    }

    #[test]
    fn test_legacy_type_codes() {
        assert_eq!(DeviceKind::from_type_code(1), Some(DeviceKind::Anchor));
        assert_eq!(DeviceKind::from_type_code(2), Some(DeviceKind::Tag));
        assert_eq!(DeviceKind::from_type_code(7), None);
        assert_eq!(DeviceKind::Tag.type_code(), 2);
    }

    #[test]
    fn test_device_row_json_shape() {
        let json = r#"{ "id": 4, "mac": "00:11:22:33:44:04", "kind": "tag" }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert!(device.is_tag());
        assert_eq!(device.position_x, None);

        let legacy: Device = serde_json::from_str(r#"{ "id": 1, "mac": "a1", "kind": 1, "position_x": 0.5 }"#).unwrap();
        assert!(legacy.is_anchor());
        assert!(serde_json::from_str::<Device>(r#"{ "id": 1, "mac": "a1", "kind": 3 }"#).is_err());
        assert_eq!(serde_json::to_string(&DeviceKind::Anchor).unwrap(), r#""anchor""#);

        let sample: RangeSampleRow = serde_json::from_str(r#"{ "id": 1, "source_id": 4, "dest_id": 1 }"#).unwrap();
        assert_eq!(sample.distance_cm, None);
    }

    #[test]
    fn test_estimate_point_only_when_finite() {
        assert_eq!(PositionEstimate::new(4, 1.0, 2.0).point(), Some(Point2::new(1.0, 2.0)));
        assert_eq!(PositionEstimate::new(4, f64::INFINITY, 2.0).point(), None);
        assert_eq!(PositionEstimate::undetermined(4).point(), None);
    }
}

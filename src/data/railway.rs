use serde::{Deserialize, Serialize};

use super::osm::{OsmId, Tags};

pub const UNKNOWN_NAME: &str = "Unknown";

/// Fixed leading columns of the point table. Node tags follow them.
pub const POINT_COLUMNS: [&str; 9] = [
    "railway_id",
    "railway_name",
    "railway_type",
    "node_id",
    "sequence",
    "lat",
    "lon",
    "is_start",
    "is_end",
];

/// One row per way carrying a `railway` tag.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RailwaySummary {
    pub railway_id: OsmId,
    pub name: String,
    pub railway_type: String,
    pub gauge: String,
    pub electrified: String,
    pub service: String,
    pub usage: String,
    /// Declared `nd` references, resolved or not.
    pub node_count: usize,
}

/// One row per resolved node reference of a railway.
#[derive(Debug, Clone, PartialEq)]
pub struct RailwayPoint {
    pub railway_id: OsmId,
    pub railway_name: String,
    pub railway_type: String,
    pub node_id: OsmId,
    /// 1-based position in the declared reference list.
    pub sequence: usize,
    pub lat: f64,
    pub lon: f64,
    pub is_start: bool,
    pub is_end: bool,
    /// Tags of the resolved node, merged after the fixed columns.
    pub tags: Tags,
}

impl RailwayPoint {
    /// Values of the fixed columns, in `POINT_COLUMNS` order.
    pub fn fixed_values(&self) -> [String; 9] {
        [
            self.railway_id.clone(),
            self.railway_name.clone(),
            self.railway_type.clone(),
            self.node_id.clone(),
            self.sequence.to_string(),
            format_coordinate(self.lat),
            format_coordinate(self.lon),
            self.is_start.to_string(),
            self.is_end.to_string(),
        ]
    }
}

/// Shortest round-trip form, always with a decimal point and never in exponent
/// notation (`40.0`, `-0.00005`).
pub fn format_coordinate(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{text}.0")
    } else {
        text
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RailwayExtraction {
    pub railways: Vec<RailwaySummary>,
    pub points: Vec<RailwayPoint>,
}

/// What to do with a node tag whose key equals one of `POINT_COLUMNS`.
#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TagCollisionPolicy {
    /// Keep the tag; in tabular output it replaces the fixed value.
    #[default]
    Overwrite,
    /// Store the tag as `node:<key>`.
    Rename,
    /// Abort the extraction.
    Reject,
}

use self::osm::{OsmNode, OsmWay};

pub mod osm;
pub mod railway;

/// Elements of a .osm file as they appear in the document, before any validation.
/// Relations and metadata are dropped by the parser.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct OsmDocument {
    pub nodes: Vec<OsmNode>,
    pub ways: Vec<OsmWay>,
}

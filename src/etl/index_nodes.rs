use std::collections::HashMap;

use log::info;

use crate::data::osm::{collect_tags, Node, OsmId, OsmNode};
use crate::data::OsmDocument;
use crate::errors::{Error, Result};

/// Lookup from node id to coordinates and tags. Built once, read-only afterwards.
#[derive(Debug, Default)]
pub struct NodeIndex {
    nodes: HashMap<OsmId, Node>,
}

impl NodeIndex {
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

fn parse_coordinate(value: Option<&String>, attr: &str, id: &str) -> Result<f64> {
    let raw = value.ok_or_else(|| Error::malformed(format!("node {id}: missing '{attr}' attribute")))?;
    raw.trim().parse::<f64>()
        .map_err(|err| Error::malformed(format!("node {id}: invalid {attr} '{raw}': {err}")))
}

fn validate_node(raw: &OsmNode) -> Result<Node> {
    let id = raw.id.as_ref()
        .ok_or_else(|| Error::malformed("node without 'id' attribute"))?;
    let lat = parse_coordinate(raw.lat.as_ref(), "lat", id)?;
    let lon = parse_coordinate(raw.lon.as_ref(), "lon", id)?;
    let tags = collect_tags(&raw.tags, &format!("node {id}"))?;

    Ok(Node {
        id: id.clone(),
        lat,
        lon,
        tags,
    })
}

/// Indexes every node of the document. Any malformed node aborts the whole index;
/// a repeated id replaces the earlier node.
pub fn index_nodes(doc: &OsmDocument) -> Result<NodeIndex> {
    let mut nodes = HashMap::with_capacity(doc.nodes.len());
    for raw in &doc.nodes {
        let node = validate_node(raw)?;
        nodes.insert(node.id.clone(), node);
    }

    let index = NodeIndex { nodes };
    info!(nodes = index.len(); "Collected node coordinates");
    Ok(index)
}

use log::{info, warn};

use crate::data::osm::{collect_tags, Node, OsmWay, Tags};
use crate::data::railway::{
    RailwayExtraction, RailwayPoint, RailwaySummary, TagCollisionPolicy, POINT_COLUMNS, UNKNOWN_NAME,
};
use crate::data::OsmDocument;
use crate::errors::{Error, Result};

use super::index_nodes::NodeIndex;

const RAILWAY_KEY: &str = "railway";
const RENAMED_TAG_PREFIX: &str = "node:";

pub struct RailwayExtractor<'a> {
    nodes: &'a NodeIndex,
    collisions: TagCollisionPolicy,
}

impl<'a> RailwayExtractor<'a> {
    pub fn new(nodes: &'a NodeIndex, collisions: TagCollisionPolicy) -> Self {
        RailwayExtractor {
            nodes,
            collisions,
        }
    }

    fn optional(tags: &Tags, key: &str) -> String {
        tags.get(key).cloned().unwrap_or_default()
    }

    fn summarize(way_id: &str, tags: &Tags, node_count: usize) -> RailwaySummary {
        RailwaySummary {
            railway_id: way_id.to_string(),
            name: tags.get("name").cloned().unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            railway_type: Self::optional(tags, RAILWAY_KEY),
            gauge: Self::optional(tags, "gauge"),
            electrified: Self::optional(tags, "electrified"),
            service: Self::optional(tags, "service"),
            usage: Self::optional(tags, "usage"),
            node_count,
        }
    }

    /// Node tags as they end up on a point, after applying the collision policy.
    fn point_tags(&self, node: &Node) -> Result<Tags> {
        if self.collisions == TagCollisionPolicy::Overwrite {
            return Ok(node.tags.clone());
        }

        let mut tags = Tags::with_capacity(node.tags.len());
        for (key, value) in &node.tags {
            if !POINT_COLUMNS.contains(&key.as_str()) {
                tags.insert(key.clone(), value.clone());
                continue;
            }
            match self.collisions {
                TagCollisionPolicy::Reject => {
                    return Err(Error::tag_collision(format!(
                        "node {}: tag '{key}' collides with a point column", node.id
                    )));
                },
                _ => {
                    let renamed = format!("{RENAMED_TAG_PREFIX}{key}");
                    if node.tags.contains_key(&renamed) {
                        return Err(Error::tag_collision(format!(
                            "node {}: tag '{key}' cannot be renamed, '{renamed}' is already set", node.id
                        )));
                    }
                    tags.insert(renamed, value.clone());
                },
            }
        }
        Ok(tags)
    }

    fn extract_way(&self, way: &OsmWay, output: &mut RailwayExtraction) -> Result<()> {
        let owner = format!("way {}", way.id.as_deref().unwrap_or("<no id>"));
        let tags = collect_tags(&way.tags, &owner)?;
        if !tags.contains_key(RAILWAY_KEY) {
            return Ok(());
        }
        let way_id = way.id.as_ref()
            .ok_or_else(|| Error::malformed("railway way without 'id' attribute"))?;

        let node_refs = way.node_refs.iter()
            .map(|node_ref| node_ref.as_deref()
                .ok_or_else(|| Error::malformed(format!("way {way_id}: nd without 'ref' attribute"))))
            .collect::<Result<Vec<&str>>>()?;

        let summary = Self::summarize(way_id, &tags, node_refs.len());
        let last = node_refs.len().saturating_sub(1);

        for (seq, node_ref) in node_refs.iter().enumerate() {
            // Unresolved references still take up a position.
            let Some(node) = self.nodes.get(node_ref) else {
                continue;
            };
            output.points.push(RailwayPoint {
                railway_id: summary.railway_id.clone(),
                railway_name: summary.name.clone(),
                railway_type: summary.railway_type.clone(),
                node_id: node.id.clone(),
                sequence: seq + 1,
                lat: node.lat,
                lon: node.lon,
                is_start: seq == 0,
                is_end: seq == last,
                tags: self.point_tags(node)?,
            });
        }

        output.railways.push(summary);
        Ok(())
    }

    /// Walks the ways of the document in order and emits one summary per railway
    /// plus one point per resolvable node reference.
    pub fn extract(&self, doc: &OsmDocument) -> Result<RailwayExtraction> {
        if self.nodes.is_empty() && !doc.ways.is_empty() {
            warn!(ways = doc.ways.len(); "No nodes indexed, railways will have no points");
        }
        let mut output = RailwayExtraction::default();
        for way in &doc.ways {
            self.extract_way(way, &mut output)?;
        }

        let declared: usize = output.railways.iter().map(|railway| railway.node_count).sum();
        let unresolved = declared - output.points.len();
        if unresolved > 0 {
            warn!(unresolved = unresolved; "Railway node references missing from the extract");
        }
        info!(railways = output.railways.len(), points = output.points.len(); "Processed railway ways");
        Ok(output)
    }
}

use indexmap::IndexMap;

use crate::errors::{Error, Result};

/// OSM identifiers are kept in their lexical form.
pub type OsmId = String;

pub type Tags = IndexMap<String, String>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RawTag {
    pub k: Option<String>,
    pub v: Option<String>,
}

#[cfg(test)]
impl RawTag {
    pub fn new(k: &str, v: &str) -> Self {
        RawTag {
            k: Some(k.to_string()),
            v: Some(v.to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OsmNode {
    pub id: Option<String>,
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub tags: Vec<RawTag>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct OsmWay {
    pub id: Option<String>,
    pub tags: Vec<RawTag>,
    /// `ref` attribute of each `nd` child, in document order.
    pub node_refs: Vec<Option<String>>,
}

/// Validated node, as held by the node index.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: OsmId,
    pub lat: f64,
    pub lon: f64,
    pub tags: Tags,
}

/// Turns the raw `tag` children of an element into a key/value map. A repeated key
/// keeps its first position and takes the last value.
pub fn collect_tags(raw: &[RawTag], owner: &str) -> Result<Tags> {
    let mut tags = Tags::with_capacity(raw.len());
    for tag in raw {
        let k = tag.k.as_ref()
            .ok_or_else(|| Error::malformed(format!("{owner}: tag without 'k' attribute")))?;
        let v = tag.v.as_ref()
            .ok_or_else(|| Error::malformed(format!("{owner}: tag '{k}' without 'v' attribute")))?;
        tags.insert(k.clone(), v.clone());
    }
    Ok(tags)
}

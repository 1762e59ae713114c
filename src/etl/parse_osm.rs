use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use xz::bufread::XzDecoder;

use crate::data::osm::{OsmNode, OsmWay, RawTag};
use crate::data::OsmDocument;
use crate::errors::{Error, Result};

/// Element whose children are currently being read.
enum ParserState {
    Top,
    Node(OsmNode),
    Way(OsmWay),
    Relation,
}

fn parse_node(el: &BytesStart) -> Result<OsmNode> {
    let mut node = OsmNode::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"id" => node.id = Some(attribute.unescape_value()?.into_owned()),
            b"lat" => node.lat = Some(attribute.unescape_value()?.into_owned()),
            b"lon" => node.lon = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }
    Ok(node)
}

fn parse_way(el: &BytesStart) -> Result<OsmWay> {
    let mut way = OsmWay::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == b"id" {
            way.id = Some(attribute.unescape_value()?.into_owned());
        }
    }
    Ok(way)
}

fn parse_tag(el: &BytesStart) -> Result<RawTag> {
    let mut tag = RawTag::default();
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        match attribute.key.as_ref() {
            b"k" => tag.k = Some(attribute.unescape_value()?.into_owned()),
            b"v" => tag.v = Some(attribute.unescape_value()?.into_owned()),
            _ => (),
        }
    }
    Ok(tag)
}

fn parse_nd_ref(el: &BytesStart) -> Result<Option<String>> {
    for attribute_res in el.attributes() {
        let attribute = attribute_res?;
        if attribute.key.as_ref() == b"ref" {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Handles an opening tag. Self-closing `node`/`way` elements are complete right away.
fn open_element(state: &mut ParserState, doc: &mut OsmDocument, el: &BytesStart, is_empty: bool) -> Result<()> {
    match el.name().as_ref() {
        b"node" => {
            let node = parse_node(el)?;
            if is_empty {
                doc.nodes.push(node);
            } else {
                *state = ParserState::Node(node);
            }
        },
        b"way" => {
            let way = parse_way(el)?;
            if is_empty {
                doc.ways.push(way);
            } else {
                *state = ParserState::Way(way);
            }
        },
        b"relation" => {
            if !is_empty {
                *state = ParserState::Relation;
            }
        },
        b"tag" => match state {
            ParserState::Node(node) => node.tags.push(parse_tag(el)?),
            ParserState::Way(way) => way.tags.push(parse_tag(el)?),
            _ => (),
        },
        b"nd" => {
            if let ParserState::Way(way) = state {
                way.node_refs.push(parse_nd_ref(el)?);
            }
        },
        _ => (),
    }
    Ok(())
}

fn close_element(state: &mut ParserState, doc: &mut OsmDocument, name: &[u8]) {
    let closes_current = matches!(
        (name, &*state),
        (b"node", ParserState::Node(_))
            | (b"way", ParserState::Way(_))
            | (b"relation", ParserState::Relation)
    );
    if !closes_current {
        return;
    }
    match std::mem::replace(state, ParserState::Top) {
        ParserState::Node(node) => doc.nodes.push(node),
        ParserState::Way(way) => doc.ways.push(way),
        _ => (),
    }
}

/// A second top-level element means the document has junk after its root.
fn check_single_root(seen_root: bool, depth: usize, position: usize) -> Result<()> {
    if seen_root && depth == 0 {
        return Err(Error::resource(format!("Junk after document element at byte {position}")));
    }
    Ok(())
}

/// Reads a whole OSM XML document into memory.
pub fn parse_document<R: BufRead>(input: R) -> Result<OsmDocument> {
    let mut reader = Reader::from_reader(input);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut doc = OsmDocument::default();
    let mut state = ParserState::Top;
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => {
                check_single_root(seen_root, depth, reader.buffer_position())?;
                seen_root = true;
                depth += 1;
                open_element(&mut state, &mut doc, &e, false)?;
            },
            Event::Empty(e) => {
                check_single_root(seen_root, depth, reader.buffer_position())?;
                seen_root = true;
                open_element(&mut state, &mut doc, &e, true)?;
            },
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                close_element(&mut state, &mut doc, e.name().as_ref());
            },
            Event::Text(_) if depth == 0 => {
                return Err(Error::resource(format!(
                    "Text outside of the root element at byte {}", reader.buffer_position()
                )));
            },
            _ => (),
        }
        buf.clear();
    }

    if !seen_root {
        return Err(Error::resource("No root element found in OSM document"));
    }
    if depth != 0 {
        return Err(Error::resource(format!("OSM document ended with {depth} unclosed element(s)")));
    }

    debug!(nodes = doc.nodes.len(), ways = doc.ways.len(); "Parsed OSM document");
    Ok(doc)
}

/// Opens a .osm file, decompressing it on the fly when it ends in `.xz`.
pub fn open_osm_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = fs::File::open(path)
        .map_err(|err| Error::resource(format!("Could not open {}: {err}", path.display())))?;
    let file_reader = BufReader::new(file);

    if path.extension().is_some_and(|ext| ext == "xz") {
        let xz_reader = XzDecoder::new(file_reader);
        Ok(Box::new(BufReader::new(xz_reader)))
    } else {
        Ok(Box::new(file_reader))
    }
}

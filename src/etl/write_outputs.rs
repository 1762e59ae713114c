use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::data::railway::{RailwayExtraction, RailwayPoint, RailwaySummary, POINT_COLUMNS};
use crate::errors::Result;

const RAILWAY_COLUMNS: [&str; 8] = [
    "railway_id",
    "name",
    "railway_type",
    "gauge",
    "electrified",
    "service",
    "usage",
    "node_count",
];

pub fn write_railways_csv(path: &Path, railways: &[RailwaySummary]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(RAILWAY_COLUMNS)?;
    for railway in railways {
        writer.serialize(railway)?;
    }
    writer.flush()?;
    Ok(())
}

/// Column layout of the point table: fixed columns, then node tag keys in order of
/// first appearance. A tag named like a fixed column maps onto that column.
fn point_columns(points: &[RailwayPoint]) -> IndexMap<&str, usize> {
    let mut columns: IndexMap<&str, usize> = IndexMap::new();
    for column in POINT_COLUMNS {
        let next = columns.len();
        columns.insert(column, next);
    }
    for point in points {
        for key in point.tags.keys() {
            let next = columns.len();
            columns.entry(key.as_str()).or_insert(next);
        }
    }
    columns
}

pub fn write_points_csv(path: &Path, points: &[RailwayPoint]) -> Result<()> {
    let columns = point_columns(points);
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(columns.keys())?;

    let mut row = vec![String::new(); columns.len()];
    for point in points {
        row.iter_mut().for_each(String::clear);
        for (cell, value) in row.iter_mut().zip(point.fixed_values()) {
            *cell = value;
        }
        for (key, value) in &point.tags {
            row[columns[key.as_str()]].clone_from(value);
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Serialize, Debug, PartialEq)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub features: Vec<Feature>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub geometry: LineString,
    pub properties: FeatureProperties,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// `[lon, lat]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct FeatureProperties {
    pub railway_id: String,
    pub name: String,
    pub railway_type: String,
}

/// One LineString feature per railway, built from its resolved points.
pub fn feature_collection(extraction: &RailwayExtraction) -> FeatureCollection {
    let mut coordinates: HashMap<&str, Vec<[f64; 2]>> = HashMap::new();
    for point in &extraction.points {
        coordinates.entry(point.railway_id.as_str()).or_default().push([point.lon, point.lat]);
    }

    let features = extraction.railways.iter()
        .map(|railway| Feature {
            kind: "Feature",
            geometry: LineString {
                kind: "LineString",
                coordinates: coordinates.get(railway.railway_id.as_str()).cloned().unwrap_or_default(),
            },
            properties: FeatureProperties {
                railway_id: railway.railway_id.clone(),
                name: railway.name.clone(),
                railway_type: railway.railway_type.clone(),
            },
        })
        .collect();

    FeatureCollection {
        kind: "FeatureCollection",
        features,
    }
}

pub fn write_geojson(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, collection)?;
    writer.flush()?;
    Ok(())
}

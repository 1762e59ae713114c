use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::data::railway::RailwayExtraction;
use crate::data::OsmDocument;
use crate::errors::{Error, Result};
use crate::UserConfig;

use super::extract_railways::RailwayExtractor;
use super::index_nodes::index_nodes;
use super::parse_osm::{open_osm_reader, parse_document};
use super::stats::RailwayStats;
use super::write_outputs::{feature_collection, write_geojson, write_points_csv, write_railways_csv};
use super::Etl;

pub const ETL_NAME: &str = "railways";

pub struct Output {
    pub extraction: RailwayExtraction,
    pub stats: RailwayStats,
}

pub struct RailwayEtl<'a> {
    config: &'a UserConfig,
}

impl RailwayEtl<'_> {
    pub fn new(config: &UserConfig) -> RailwayEtl<'_> {
        RailwayEtl {
            config
        }
    }

    fn output_paths(&self, dir: &Path) -> [PathBuf; 3] {
        [
            dir.join(&self.config.railways_file),
            dir.join(&self.config.points_file),
            dir.join(&self.config.geojson_file),
        ]
    }

    fn write_all(&self, dir: &Path, output: &Output) -> Result<()> {
        let [railways_path, points_path, geojson_path] = self.output_paths(dir);

        write_railways_csv(&railways_path, &output.extraction.railways)?;
        info!(path = &*railways_path.to_string_lossy(); "Railway information saved");

        write_points_csv(&points_path, &output.extraction.points)?;
        info!(path = &*points_path.to_string_lossy(); "Railway points saved");

        write_geojson(&geojson_path, &feature_collection(&output.extraction))?;
        info!(path = &*geojson_path.to_string_lossy(); "GeoJSON data saved");
        Ok(())
    }
}

impl Etl for RailwayEtl<'_> {
    type Input = OsmDocument;
    type Output = Output;

    fn etl_name(&self) -> &str {
        ETL_NAME
    }

    fn is_cached(&self, dir: &Path) -> Result<bool> {
        if !self.config.reuse_outputs {
            return Ok(false);
        }
        for path in self.output_paths(dir) {
            if !path.try_exists()? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn clean(&self, dir: &Path) -> Result<()> {
        for path in self.output_paths(dir) {
            if path.try_exists()? {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn extract(&mut self, _dir: &Path) -> Result<Self::Input> {
        let input_path = Path::new(&self.config.data_path);
        if !input_path.try_exists()? {
            return Err(Error::resource(format!("File '{}' does not exist", input_path.display())));
        }
        let size_mb = fs::metadata(input_path)?.len() as f64 / (1024.0 * 1024.0);
        info!(path = self.config.data_path.as_str(), size_mb = size_mb; "Reading OSM file");

        parse_document(open_osm_reader(input_path)?)
    }

    fn transform(&mut self, input: Self::Input) -> Result<Self::Output> {
        let nodes = index_nodes(&input)?;
        let extraction = RailwayExtractor::new(&nodes, self.config.tag_collisions).extract(&input)?;
        let stats = RailwayStats::compute(&extraction);

        Ok(Output {
            extraction,
            stats,
        })
    }

    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()> {
        if let Err(err) = self.write_all(dir, &output) {
            // Half-written outputs must not look like a finished run.
            self.clean(dir)?;
            return Err(err);
        }
        output.stats.log();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::{tempdir, TempDir};

    use crate::data::railway::TagCollisionPolicy;
    use crate::errors::ErrorKind;

    const SCENARIO: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6">
  <node id="n1" lat="40.0" lon="-3.0"><tag k="railway" v="level_crossing"/></node>
  <node id="n2" lat="40.1" lon="-3.1"/>
  <way id="w1">
    <nd ref="n1"/>
    <nd ref="n2"/>
    <tag k="railway" v="rail"/>
    <tag k="name" v="Jingbian-Shenmu"/>
  </way>
  <way id="w2">
    <nd ref="n1"/>
    <nd ref="n3"/>
    <tag k="railway" v="rail"/>
  </way>
  <way id="w3">
    <nd ref="n1"/>
    <nd ref="n2"/>
    <tag k="highway" v="primary"/>
  </way>
</osm>
"#;

    fn config_for(input: &Path) -> UserConfig {
        serde_json::from_value(serde_json::json!({
            "data_path": input.to_string_lossy(),
        })).unwrap()
    }

    fn write_input(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_process_writes_all_outputs() {
        let dir = tempdir().unwrap();
        let config = config_for(&write_input(&dir, "map.osm", SCENARIO));
        RailwayEtl::new(&config).process(dir.path()).unwrap();

        let railways = fs::read_to_string(dir.path().join("railways.csv")).unwrap();
        assert_eq!(
            railways.lines().collect::<Vec<_>>(),
            vec![
                "railway_id,name,railway_type,gauge,electrified,service,usage,node_count",
                "w1,Jingbian-Shenmu,rail,,,,,2",
                "w2,Unknown,rail,,,,,2",
            ]
        );

        let points = fs::read_to_string(dir.path().join("railway_points.csv")).unwrap();
        assert_eq!(
            points.lines().collect::<Vec<_>>(),
            vec![
                "railway_id,railway_name,railway_type,node_id,sequence,lat,lon,is_start,is_end,railway",
                "w1,Jingbian-Shenmu,rail,n1,1,40.0,-3.0,true,false,level_crossing",
                "w1,Jingbian-Shenmu,rail,n2,2,40.1,-3.1,false,true,",
                "w2,Unknown,rail,n1,1,40.0,-3.0,true,false,level_crossing",
            ]
        );

        let geojson: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("railways.geojson")).unwrap()).unwrap();
        assert_eq!(geojson["features"].as_array().map(Vec::len), Some(2));
        assert_eq!(geojson["features"][0]["geometry"]["coordinates"], serde_json::json!([[-3.0, 40.0], [-3.1, 40.1]]));
        assert_eq!(geojson["features"][1]["properties"]["name"], "Unknown");
    }

    #[test]
    fn test_process_is_repeatable() {
        let dir = tempdir().unwrap();
        let config = config_for(&write_input(&dir, "map.osm", SCENARIO));

        RailwayEtl::new(&config).process(dir.path()).unwrap();
        let first = fs::read(dir.path().join("railway_points.csv")).unwrap();
        RailwayEtl::new(&config).process(dir.path()).unwrap();
        let second = fs::read(dir.path().join("railway_points.csv")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reads_xz_compressed_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.osm.xz");
        let mut encoder = xz::write::XzEncoder::new(fs::File::create(&path).unwrap(), 6);
        encoder.write_all(SCENARIO.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let config = config_for(&path);
        let doc = RailwayEtl::new(&config).extract(dir.path()).unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.ways.len(), 3);
    }

    #[test]
    fn test_missing_input_is_a_resource_error() {
        let dir = tempdir().unwrap();
        let config = config_for(&dir.path().join("absent.osm"));
        let err = RailwayEtl::new(&config).process(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Resource);
    }

    #[test]
    fn test_failed_run_leaves_no_outputs() {
        let dir = tempdir().unwrap();
        let good = config_for(&write_input(&dir, "good.osm", SCENARIO));
        RailwayEtl::new(&good).process(dir.path()).unwrap();

        let bad = config_for(&write_input(&dir, "bad.osm", r#"<osm><node id="1" lat="x" lon="0"/></osm>"#));
        let err = RailwayEtl::new(&bad).process(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedInput);
        assert!(!dir.path().join("railways.csv").exists());
        assert!(!dir.path().join("railway_points.csv").exists());
        assert!(!dir.path().join("railways.geojson").exists());
    }

    #[test]
    fn test_reuse_outputs_skips_existing_run() {
        let dir = tempdir().unwrap();
        let input = write_input(&dir, "map.osm", SCENARIO);
        let mut config = config_for(&input);
        RailwayEtl::new(&config).process(dir.path()).unwrap();

        config.reuse_outputs = true;
        fs::write(&input, "not xml at all").unwrap();
        assert!(RailwayEtl::new(&config).is_cached(dir.path()).unwrap());
        RailwayEtl::new(&config).process(dir.path()).unwrap();
    }

    #[test]
    fn test_rejecting_collisions_fails_the_run() {
        let dir = tempdir().unwrap();
        let xml = r#"<osm>
            <node id="1" lat="1.0" lon="2.0"><tag k="node_id" v="x"/></node>
            <way id="9"><nd ref="1"/><tag k="railway" v="rail"/></way>
        </osm>"#;
        let mut config = config_for(&write_input(&dir, "map.osm", xml));
        config.tag_collisions = TagCollisionPolicy::Reject;
        let err = RailwayEtl::new(&config).process(dir.path()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TagCollision);
    }
}

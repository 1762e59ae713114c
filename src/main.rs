mod etl;
mod data;
mod errors;

use std::env;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::data::railway::TagCollisionPolicy;
use crate::etl::railways::RailwayEtl;
use crate::etl::Etl;
use crate::errors::{Error, Result};

const DEFAULT_CONFIG_PATH: &str = "config/railways.json";

#[derive(Deserialize, Debug)]
pub struct UserConfig {
    /// .osm or .osm.xz extract to read.
    pub data_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_railways_file")]
    pub railways_file: String,
    #[serde(default = "default_points_file")]
    pub points_file: String,
    #[serde(default = "default_geojson_file")]
    pub geojson_file: String,
    #[serde(default)]
    pub tag_collisions: TagCollisionPolicy,
    /// Skip the run when all outputs are already present.
    #[serde(default)]
    pub reuse_outputs: bool,
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_railways_file() -> String {
    "railways.csv".to_string()
}

fn default_points_file() -> String {
    "railway_points.csv".to_string()
}

fn default_geojson_file() -> String {
    "railways.geojson".to_string()
}

fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path)
        .map_err(|err| Error::config(format!("Could not open config file {path}: {err}")))?;
    serde_json::from_reader(file)
        .map_err(|err| Error::config(format!("Could not parse config {path}: {err}")))
}

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = Path::new(&config.output_dir).to_path_buf();
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    let output_dir = create_output_dir(&user_config)?;

    let mut etl = RailwayEtl::new(&user_config);
    etl.process(&output_dir)?;

    Ok(())
}

pub mod extract_railways;
pub mod index_nodes;
pub mod parse_osm;
pub mod railways;
pub mod stats;
pub mod write_outputs;

use std::path::Path;

use log::{error, info};

use crate::errors::Result;

/// One extract/transform/load step whose outputs live in a directory.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    /// Runs extract, transform and load, unless `is_cached` says the outputs are
    /// current. Stale outputs are cleaned before extracting.
    fn process(&mut self, dir: &Path) -> Result<()> {
        let etl_name = self.etl_name().to_string();
        info!(etl_name = etl_name.as_str(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = etl_name.as_str(); "Using cached value");
        } else {
            self.clean(dir)?;

            info!(etl_name = etl_name.as_str(); "Extracting");
            let input = log_failure(&etl_name, "Extraction", self.extract(dir))?;

            info!(etl_name = etl_name.as_str(); "Transforming");
            let output = log_failure(&etl_name, "Transformation", self.transform(input))?;

            info!(etl_name = etl_name.as_str(); "Loading");
            log_failure(&etl_name, "Loading", self.load(dir, output))?;
        }
        info!(etl_name = etl_name.as_str(); "Process finished");
        Ok(())
    }
}

fn log_failure<T>(etl_name: &str, stage: &str, result: Result<T>) -> Result<T> {
    if let Err(err) = &result {
        let kind = format!("{:?}", err.kind);
        error!(etl_name = etl_name, stage = stage, kind = kind.as_str(), err = err.message.as_str(); "ETL stage failed");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{Error, ErrorKind};

    #[derive(Default)]
    struct RecordingEtl {
        cached: bool,
        fail_transform: bool,
        stages: Vec<&'static str>,
    }

    impl Etl for RecordingEtl {
        type Input = u32;
        type Output = u32;

        fn etl_name(&self) -> &str {
            "recording"
        }

        fn is_cached(&self, _dir: &Path) -> Result<bool> {
            Ok(self.cached)
        }

        fn clean(&self, _dir: &Path) -> Result<()> {
            Ok(())
        }

        fn extract(&mut self, _dir: &Path) -> Result<u32> {
            self.stages.push("extract");
            Ok(1)
        }

        fn transform(&mut self, input: u32) -> Result<u32> {
            self.stages.push("transform");
            if self.fail_transform {
                return Err(Error::malformed("bad input"));
            }
            Ok(input + 1)
        }

        fn load(&mut self, _dir: &Path, _output: u32) -> Result<()> {
            self.stages.push("load");
            Ok(())
        }
    }

    #[test]
    fn test_process_runs_stages_in_order() {
        let mut etl = RecordingEtl::default();
        etl.process(Path::new(".")).unwrap();
        assert_eq!(etl.stages, vec!["extract", "transform", "load"]);
    }

    #[test]
    fn test_process_stops_at_failing_stage() {
        let mut etl = RecordingEtl { fail_transform: true, ..Default::default() };
        let err = etl.process(Path::new(".")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::MalformedInput);
        assert_eq!(etl.stages, vec!["extract", "transform"]);
    }

    #[test]
    fn test_process_skips_cached_outputs() {
        let mut etl = RecordingEtl { cached: true, ..Default::default() };
        etl.process(Path::new(".")).unwrap();
        assert!(etl.stages.is_empty());
    }
}

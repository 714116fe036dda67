use serde::Serialize;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{prevent_overwrite, Executor, PbmError, VERSION};

/// pipeline stages, in the order a run visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    AnalysisFile,
    Masliner,
    SpatialDetrend,
    AverageProbes,
    DataMatrix,
}

/// record of what a single stage invocation consumed and produced
#[derive(Debug, Clone, Serialize)]
pub struct StageDescriptor {
    pub stage: StageType,
    pub inputs: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub artifacts: Vec<PathBuf>,
}

impl StageDescriptor {
    pub fn new(stage: StageType, output_dir: &Path) -> Self {
        Self {
            stage,
            inputs: Vec::new(),
            output_dir: output_dir.to_path_buf(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_inputs<I: IntoIterator<Item = PathBuf>>(mut self, inputs: I) -> Self {
        self.inputs.extend(inputs);
        self
    }

    pub fn with_artifacts<I: IntoIterator<Item = PathBuf>>(mut self, artifacts: I) -> Self {
        self.artifacts.extend(artifacts);
        self
    }
}

/// record of a full pipeline run, written next to the data matrices
#[derive(Debug, Clone, Serialize)]
pub struct RunDescriptor {
    pub version: String,
    pub executor: Executor,
    pub analysis_file: Option<PathBuf>,
    pub stages: Vec<StageDescriptor>,
}

impl RunDescriptor {
    pub fn new(executor: Executor) -> Self {
        Self {
            version: VERSION.to_string(),
            executor,
            analysis_file: None,
            stages: Vec::new(),
        }
    }

    pub fn push(&mut self, stage: StageDescriptor) {
        log::info!(
            "INFO: {:?} produced {} artifacts in {}",
            stage.stage,
            stage.artifacts.len(),
            stage.output_dir.display()
        );
        self.stages.push(stage);
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, PbmError> {
        let path = path.as_ref();
        prevent_overwrite(path)?;

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_run_descriptor_is_written_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run_descriptor.json");

        let mut descriptor = RunDescriptor::new(Executor::Local);
        descriptor.push(
            StageDescriptor::new(StageType::Masliner, dir.path())
                .with_artifacts(vec![dir.path().join("madj001_1-8.gpr")]),
        );

        descriptor.write(&path).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(json["executor"], "Local");
        assert_eq!(json["stages"][0]["stage"], "masliner");
        assert!(descriptor.write(&path).is_err());
    }
}

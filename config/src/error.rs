use std::path::PathBuf;
use thiserror::Error;

/// error handling for every pipeline stage
#[derive(Debug, Error)]
pub enum PbmError {
    #[error("This file already exists: {}\nAborting to prevent overwrite", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Missing required input: no file matching '{pattern}' in {}", dir.display())]
    MissingInput { dir: PathBuf, pattern: String },
    #[error(
        "Ambiguous input: {count} files match '{pattern}' in {}, expected exactly one",
        dir.display()
    )]
    AmbiguousInput {
        dir: PathBuf,
        pattern: String,
        count: usize,
    },
    #[error(
        "Quality metric {value} in {} is below the threshold {threshold}. \
         Exclude more scans and re-run this stage",
        file.display()
    )]
    QualityThreshold {
        file: PathBuf,
        value: f64,
        threshold: f64,
    },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Job '{job}' failed ({status}): {stderr}")]
    ToolFailed {
        job: String,
        status: String,
        stderr: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Could not serialize descriptor: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<glob::GlobError> for PbmError {
    fn from(error: glob::GlobError) -> Self {
        PbmError::Io(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converts_into_pbm_error<E: Into<PbmError>>() {}

    #[test]
    fn test_glob_errors_become_io_errors() {
        converts_into_pbm_error::<glob::GlobError>();
        converts_into_pbm_error::<glob::PatternError>();

        let error: PbmError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "scans_488").into();
        assert!(matches!(error, PbmError::Io(_)));
        assert_eq!(error.to_string(), "IO error: scans_488");
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let error: PbmError = glob::Pattern::new("madj[").unwrap_err().into();
        assert!(matches!(error, PbmError::Pattern(_)));
    }
}

//! Locates the analysis file of an array design, building it when missing

use log::{info, warn};
use std::path::{Path, PathBuf};

use config::{
    capture_comfile, find_files, prevent_overwrite, Comfile, PbmError, ANALYSIS_COMFILE,
    ANALYSIS_PATTERN, DESIGN_MARKER, DESIGN_PATTERN, GPR_PATTERN, SEQUENCE_PATTERN,
};

use crate::cli::Args;

/// The three convention-named files an analysis file is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisInputs {
    pub design: PathBuf,
    pub sequence: PathBuf,
    pub gpr: PathBuf,
}

/// Returns the analysis file in `args.dir`, generating it if there is none
///
/// # Arguments
///
/// * `args` - directory to search and builder command line
///
/// # Returns
///
/// * `Result<PathBuf, PbmError>` - path to the analysis file
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::from(vec!["--dir".to_string(), "/data/design".to_string()]);
/// let analysis = resolve_analysis_file(&args).unwrap();
/// ```
pub fn resolve_analysis_file(args: &Args) -> Result<PathBuf, PbmError> {
    let dir = args.dir.as_path();
    let found = find_files(dir, ANALYSIS_PATTERN)?;

    match found.len() {
        0 => {
            info!(
                "INFO: no analysis file in {}, generating one...",
                dir.display()
            );
            generate_analysis_file(dir, &args.tool)
        }
        1 => {
            info!("INFO: using analysis file {}", found[0].display());
            Ok(found[0].clone())
        }
        count => Err(PbmError::AmbiguousInput {
            dir: dir.to_path_buf(),
            pattern: ANALYSIS_PATTERN.to_string(),
            count,
        }),
    }
}

/// Builds a new analysis file from the design, sequence and .gpr files in `dir`
pub fn generate_analysis_file(dir: &Path, tool: &str) -> Result<PathBuf, PbmError> {
    let inputs = locate_inputs(dir)?;
    let id = extract_identifier(&inputs.design)?;

    let comfile = make_analysis_comfile(&inputs, tool, &dir.join(ANALYSIS_COMFILE))?;
    let analysis = dir.join(analysis_file_name(&id));
    run_analysis_comfile(&comfile, &analysis, dir)?;

    info!("SUCCESS: generated analysis file {}", analysis.display());
    Ok(analysis)
}

/// Finds the design, sequence and reference files needed to build an
/// analysis file
pub fn locate_inputs(dir: &Path) -> Result<AnalysisInputs, PbmError> {
    let design = require_unique(dir, DESIGN_PATTERN)?;
    let sequence = require_unique(dir, SEQUENCE_PATTERN)?;

    let gprs = find_files(dir, GPR_PATTERN)?;
    let gpr = match gprs.first() {
        Some(gpr) => gpr.clone(),
        None => {
            return Err(PbmError::MissingInput {
                dir: dir.to_path_buf(),
                pattern: GPR_PATTERN.to_string(),
            })
        }
    };

    if gprs.len() > 1 {
        warn!(
            "WARN: {} files match '{}' in {}, using {}",
            gprs.len(),
            GPR_PATTERN,
            dir.display(),
            gpr.display()
        );
    }

    Ok(AnalysisInputs {
        design,
        sequence,
        gpr,
    })
}

/// Returns the single file matching `pattern`, failing on zero or many
pub fn require_unique(dir: &Path, pattern: &str) -> Result<PathBuf, PbmError> {
    let mut found = find_files(dir, pattern)?;

    match found.len() {
        0 => Err(PbmError::MissingInput {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        }),
        1 => Ok(found.remove(0)),
        count => Err(PbmError::AmbiguousInput {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
            count,
        }),
    }
}

/// Extracts the design identifier: the part of the design file name in
/// front of the design marker
///
/// # Example
///
/// ```rust, ignore
/// let id = extract_identifier(Path::new("/a/sample_D_DNAFront_BCBottom_20180616.tdt")).unwrap();
/// assert_eq!(id, "sample");
/// ```
pub fn extract_identifier(design: &Path) -> Result<String, PbmError> {
    let name = design
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();

    let end = name.find(DESIGN_MARKER).ok_or_else(|| {
        PbmError::InvalidInput(format!(
            "design file {} does not contain '{}'",
            design.display(),
            DESIGN_MARKER
        ))
    })?;

    let id = &name[..end];
    if id.is_empty() {
        return Err(PbmError::InvalidInput(format!(
            "design file {} has no identifier before '{}'",
            design.display(),
            DESIGN_MARKER
        )));
    }

    Ok(id.to_string())
}

pub fn analysis_file_name(id: &str) -> String {
    format!("ID_{}_genomic_analysis.txt", id)
}

/// Writes the comfile driving the analysis-file builder
pub fn make_analysis_comfile(
    inputs: &AnalysisInputs,
    tool: &str,
    comfile: &Path,
) -> Result<PathBuf, PbmError> {
    Comfile::new(tool)
        .arg("-i", &inputs.design)
        .arg("-j", &inputs.sequence)
        .arg("-g", &inputs.gpr)
        .write(comfile)
}

/// Runs the builder comfile and stores its output as the analysis file
pub fn run_analysis_comfile(
    comfile: &Path,
    analysis: &Path,
    workdir: &Path,
) -> Result<PathBuf, PbmError> {
    prevent_overwrite(analysis)?;

    let contents = capture_comfile(comfile, workdir)?;
    std::fs::write(analysis, contents)?;

    Ok(analysis.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DESIGN: &str = "sample_D_DNAFront_BCBottom_20180616.tdt";
    const SEQUENCE: &str = "sample_SequenceList_20180616.txt";
    const GPR: &str = "258560610008_G600_488_1-8.gpr";

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), "x").unwrap();
        }
    }

    fn args(dir: &Path) -> Args {
        Args {
            dir: dir.to_path_buf(),
            tool: "echo".to_string(),
        }
    }

    #[test]
    fn test_existing_analysis_file_is_returned() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["ID_x_genomic_analysis.txt"]);

        let found = resolve_analysis_file(&args(dir.path())).unwrap();
        assert_eq!(found, dir.path().join("ID_x_genomic_analysis.txt"));
    }

    #[test]
    fn test_two_analysis_files_are_ambiguous() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &["a_analysis.txt", "b_analysis.txt"]);

        let err = resolve_analysis_file(&args(dir.path())).unwrap_err();
        assert!(matches!(err, PbmError::AmbiguousInput { count: 2, .. }));
    }

    #[test]
    fn test_generates_analysis_file_from_inputs() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &[DESIGN, SEQUENCE, GPR]);

        let analysis = resolve_analysis_file(&args(dir.path())).unwrap();
        assert_eq!(analysis, dir.path().join("ID_sample_genomic_analysis.txt"));

        let comfile = std::fs::read_to_string(dir.path().join(ANALYSIS_COMFILE)).unwrap();
        let lines: Vec<&str> = comfile.lines().collect();
        assert_eq!(lines[0], "echo");
        assert_eq!(lines[1], format!("-i {}", dir.path().join(DESIGN).display()));
        assert_eq!(lines[2], format!("-j {}", dir.path().join(SEQUENCE).display()));
        assert_eq!(lines[3], format!("-g {}", dir.path().join(GPR).display()));

        let contents = std::fs::read_to_string(&analysis).unwrap();
        assert!(contents.starts_with("-i "));

        // the generated file is found on the next run
        assert_eq!(resolve_analysis_file(&args(dir.path())).unwrap(), analysis);
    }

    #[test]
    fn test_missing_or_duplicated_design_fails() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &[SEQUENCE, GPR]);
        assert!(matches!(
            resolve_analysis_file(&args(dir.path())),
            Err(PbmError::MissingInput { pattern, .. }) if pattern == DESIGN_PATTERN
        ));

        touch(
            dir.path(),
            &[DESIGN, "other_D_DNAFront_BCBottom_20190101.tdt"],
        );
        assert!(matches!(
            resolve_analysis_file(&args(dir.path())),
            Err(PbmError::AmbiguousInput { count: 2, .. })
        ));
        assert!(!dir.path().join(ANALYSIS_COMFILE).exists());
    }

    #[test]
    fn test_missing_or_duplicated_sequence_fails() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &[DESIGN, GPR]);
        assert!(matches!(
            locate_inputs(dir.path()),
            Err(PbmError::MissingInput { pattern, .. }) if pattern == SEQUENCE_PATTERN
        ));

        touch(dir.path(), &[SEQUENCE, "b_SequenceList_2.txt"]);
        assert!(matches!(
            locate_inputs(dir.path()),
            Err(PbmError::AmbiguousInput { .. })
        ));
    }

    #[test]
    fn test_missing_gpr_fails_and_many_pick_first() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &[DESIGN, SEQUENCE]);
        assert!(matches!(
            locate_inputs(dir.path()),
            Err(PbmError::MissingInput { pattern, .. }) if pattern == GPR_PATTERN
        ));

        touch(dir.path(), &["b_2-8.gpr", "a_1-8.gpr"]);
        let inputs = locate_inputs(dir.path()).unwrap();
        assert_eq!(inputs.gpr, dir.path().join("a_1-8.gpr"));
    }

    #[test]
    fn test_extract_identifier() {
        assert_eq!(
            extract_identifier(Path::new("/x/y/sample_D_DNAFront_BCBottom_20180616.tdt")).unwrap(),
            "sample"
        );
        assert_eq!(
            extract_identifier(Path::new(
                "/x/ENH_TILE_001_085605_D_DNAFront_BCBottom_20180616.tdt"
            ))
            .unwrap(),
            "ENH_TILE_001_085605"
        );
        assert!(extract_identifier(Path::new("/x/sample_DNAFront_BCBottom.tdt")).is_err());
        assert!(extract_identifier(Path::new("/x/_D_DNAFront_BCBottom.tdt")).is_err());
    }

    #[test]
    fn test_identifier_ignores_marker_in_parent_dirs() {
        assert_eq!(
            extract_identifier(Path::new(
                "/x/old_D_DNAFront_BCBottom_runs/sample_D_DNAFront_BCBottom_20180616.tdt"
            ))
            .unwrap(),
            "sample"
        );
        assert!(extract_identifier(Path::new("/x/old_D_DNAFront_BCBottom/design.tdt")).is_err());
    }

    #[test]
    fn test_existing_comfile_blocks_generation() {
        let dir = tempdir().unwrap();
        touch(dir.path(), &[DESIGN, SEQUENCE, GPR, ANALYSIS_COMFILE]);

        assert!(matches!(
            resolve_analysis_file(&args(dir.path())),
            Err(PbmError::AlreadyExists(_))
        ));
    }
}

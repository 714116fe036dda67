use log::info;
use std::path::{Path, PathBuf};

use config::{
    create_stage_dir, find_files, run_comfile, write_collection, AvgType, Comfile, PbmError,
    AVERAGE_DIR, NORM_LIST, NORM_PATTERN,
};

use crate::cli::Args;

/// Runs the three probe averaging variants over a detrended directory
///
/// # Arguments
///
/// * `args` - detrended directory, averaging directory and executor
///
/// # Returns
///
/// * `Result<PathBuf, PbmError>` - the averaging directory holding every
///   averaged file
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::from(vec!["--norm-dir".to_string(), "/data/488/spatial_detrend".to_string()]);
/// let avg_dir = average_probes(&args).unwrap();
/// ```
pub fn average_probes(args: &Args) -> Result<PathBuf, PbmError> {
    let norm_dir = args.norm_dir.canonicalize()?;
    let avg_dir = match &args.outdir {
        Some(outdir) => std::path::absolute(outdir)?,
        None => norm_dir
            .parent()
            .unwrap_or(norm_dir.as_path())
            .join(AVERAGE_DIR),
    };
    info!("INFO: averaging probes of {}", norm_dir.display());

    let files = find_norm_files(&norm_dir)?;
    let avg_dir = create_stage_dir(&avg_dir)?;
    let manifest = make_norm_gpr_list(&files, &avg_dir)?;

    for avg in AvgType::ALL {
        let comfile =
            make_average_comfile(&args.tool, &manifest, avg, &avg_dir.join(avg.comfile_name()))?;
        run_comfile(&comfile, &avg.job_name(), &avg_dir, args.executor)?;
    }

    info!("SUCCESS: averaged probes into {}", avg_dir.display());
    Ok(avg_dir)
}

/// Returns the sorted detrended files of `dir`
pub fn find_norm_files(dir: &Path) -> Result<Vec<PathBuf>, PbmError> {
    let files = find_files(dir, NORM_PATTERN)?;
    if files.is_empty() {
        return Err(PbmError::MissingInput {
            dir: dir.to_path_buf(),
            pattern: NORM_PATTERN.to_string(),
        });
    }

    Ok(files)
}

/// Lists the absolute paths of `files` in the averaging manifest
pub fn make_norm_gpr_list(files: &[PathBuf], avg_dir: &Path) -> Result<PathBuf, PbmError> {
    let lines = files
        .iter()
        .map(std::path::absolute)
        .collect::<Result<Vec<_>, _>>()?;

    write_collection(
        avg_dir.join(NORM_LIST),
        lines.iter().map(|path| path.display().to_string()),
    )
}

pub fn make_average_comfile(
    tool: &str,
    manifest: &Path,
    avg: AvgType,
    comfile: &Path,
) -> Result<PathBuf, PbmError> {
    Comfile::new(tool)
        .arg("-l", manifest)
        .arg("-op", avg.as_str())
        .arg("-avg", avg.as_str())
        .switch("-no_gfilter")
        .write(comfile)
}

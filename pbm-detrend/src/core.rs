use log::{info, warn};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{
    chamber_suffix, collect_new_artifacts, create_stage_dir, file_name, find_files, run_comfile,
    write_collection, Comfile, DirectoryDiff, PbmError, DETREND_COMFILE, DETREND_DIR,
    DETREND_JOB, MADJ_LIST, MADJ_PATTERN,
};

use crate::cli::Args;

/// Runs spatial detrending on the highest-intensity scan of every chamber
///
/// # Arguments
///
/// * `args` - masliner directory, analysis file, output directory,
///   optional quality threshold and executor
///
/// # Returns
///
/// * `Result<Vec<PathBuf>, PbmError>` - files the detrending job created,
///   relocated into the output directory
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::from(vec![
///     "--madj-dir".to_string(), "/data/488/masliner".to_string(),
///     "--analysis".to_string(), "/data/ID_x_genomic_analysis.txt".to_string(),
/// ]);
/// let normalized = spatial_detrend(&args).unwrap();
/// ```
pub fn spatial_detrend(args: &Args) -> Result<Vec<PathBuf>, PbmError> {
    let madj_dir = args.madj_dir.canonicalize()?;
    let analysis = args.analysis.canonicalize()?;
    let outdir = match &args.outdir {
        Some(outdir) => std::path::absolute(outdir)?,
        None => madj_dir
            .parent()
            .unwrap_or(madj_dir.as_path())
            .join(DETREND_DIR),
    };
    info!("INFO: running spatial detrending on {}", madj_dir.display());

    let selected = find_high_intensity(&madj_dir)?;
    let outdir = create_stage_dir(&outdir)?;

    let manifest = write_collection(outdir.join(MADJ_LIST), selected.iter().map(file_name))?;
    let comfile = make_spatial_detrend_comfile(
        &args.tool,
        &manifest,
        &analysis,
        &outdir.join(DETREND_COMFILE),
    )?;

    let artifacts = collect_new_artifacts(&DirectoryDiff, &madj_dir, &outdir, || {
        run_comfile(&comfile, DETREND_JOB, &madj_dir, args.executor)
    })?;

    if let Some(threshold) = args.threshold {
        check_detrend_quality(&artifacts, &args.quality_token, threshold)?;
    }

    Ok(artifacts)
}

/// Finds the masliner files of `dir` and keeps the highest-intensity one
/// per chamber
pub fn find_high_intensity(dir: &Path) -> Result<Vec<PathBuf>, PbmError> {
    let files = find_files(dir, MADJ_PATTERN)?;
    if files.is_empty() {
        return Err(PbmError::MissingInput {
            dir: dir.to_path_buf(),
            pattern: MADJ_PATTERN.to_string(),
        });
    }

    let selected = select_high_intensity(&files);
    info!(
        "INFO: selected {} of {} masliner files for detrending",
        selected.len(),
        files.len()
    );

    Ok(selected)
}

/// Keeps the naturally-last file of every chamber; `files` must already be
/// naturally sorted
pub fn select_high_intensity(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut chambers: BTreeMap<String, &PathBuf> = BTreeMap::new();

    for file in files {
        let name = file_name(file);
        let chamber = chamber_suffix(&name).unwrap_or(&name).to_string();
        chambers.insert(chamber, file);
    }

    chambers.into_values().cloned().collect()
}

pub fn make_spatial_detrend_comfile(
    tool: &str,
    manifest: &Path,
    analysis: &Path,
    comfile: &Path,
) -> Result<PathBuf, PbmError> {
    Comfile::new(tool)
        .arg("-i", manifest)
        .arg("-a", analysis)
        .switch("-keep_ctrl")
        .switch("-output_norm_files")
        .arg("-o", "norm")
        .switch("-f1med")
        .write(comfile)
}

/// Extracts every value that follows `token` in `contents`
///
/// # Example
///
/// ```rust, ignore
/// assert_eq!(parse_quality("R-squared: 0.91\n", "R-squared"), vec![0.91]);
/// ```
pub fn parse_quality(contents: &str, token: &str) -> Vec<f64> {
    let mut values = Vec::new();

    for line in contents.lines() {
        for (idx, _) in line.match_indices(token) {
            let rest = line[idx + token.len()..]
                .trim_start_matches(|c: char| c == ':' || c == '=' || c.is_whitespace());
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')))
                .unwrap_or(rest.len());

            match rest[..end].parse::<f64>() {
                Ok(value) => values.push(value),
                Err(_) => warn!("WARN: could not parse quality value in '{}'", line.trim()),
            }
        }
    }

    values
}

/// Checks the quality metric of every detrending job log against `threshold`
pub fn check_detrend_quality(
    artifacts: &[PathBuf],
    token: &str,
    threshold: f64,
) -> Result<(), PbmError> {
    let prefix = format!("{}.o", DETREND_JOB);
    let logs: Vec<&PathBuf> = artifacts
        .iter()
        .filter(|artifact| file_name(artifact).starts_with(&prefix))
        .collect();

    if logs.is_empty() {
        warn!("WARN: no {}* job log found, skipping quality check", prefix);
        return Ok(());
    }

    for log in logs {
        let values = parse_quality(&std::fs::read_to_string(log)?, token);
        if values.is_empty() {
            warn!("WARN: no '{}' found in {}", token, log.display());
            continue;
        }

        for value in values {
            if value < threshold {
                return Err(PbmError::QualityThreshold {
                    file: log.to_path_buf(),
                    value,
                    threshold,
                });
            }
        }

        info!("INFO: {} passed the quality threshold {}", log.display(), threshold);
    }

    Ok(())
}

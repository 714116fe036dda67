use log::{info, warn};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{
    chamber_suffix, collect_new_artifacts, create_stage_dir, file_name, find_files, natural_sort,
    run_comfile, series_key, write_collection, Comfile, DirectoryDiff, PbmError,
    ALTERNATE_CHANNEL, DESCRIPTION_HEADER, GPR_PATTERN, MASLINER_DIR, MASLINER_JOB,
    REFERENCE_CHANNEL,
};

use crate::cli::Args;

const CHANNEL_PREFIXES: [&str; 2] = ["F", "B"];

/// Scans of one chamber, sorted by scan intensity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChamberGroup {
    pub chamber: String,
    pub scans: Vec<PathBuf>,
}

/// Every scan of one physical slide, bucketed by chamber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSeries {
    pub key: String,
    pub chambers: Vec<ChamberGroup>,
}

impl ScanSeries {
    pub fn description_name(&self) -> String {
        format!("experiment_description_{}.txt", self.key)
    }

    pub fn comfile_name(&self) -> String {
        format!("masliner_{}.com", self.key)
    }
}

/// Runs masliner over every scan series in `args.gpr_dir`
///
/// # Arguments
///
/// * `args` - scan directory, output directory, exclusions and executor
///
/// # Returns
///
/// * `Result<Vec<PathBuf>, PbmError>` - files masliner created, now living
///   in the output directory
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::from(vec!["--gpr-dir".to_string(), "/data/488".to_string()]);
/// let madj = masliner(&args).unwrap();
/// ```
pub fn masliner(args: &Args) -> Result<Vec<PathBuf>, PbmError> {
    let gpr_dir = args.gpr_dir.canonicalize()?;
    let outdir = match &args.outdir {
        Some(outdir) => std::path::absolute(outdir)?,
        None => gpr_dir.join(MASLINER_DIR),
    };
    info!("INFO: running masliner on {}", gpr_dir.display());

    let scans = list_scans(&gpr_dir, &args.exclude)?;
    let series = group_scans(&scans)?;

    let outdir = create_stage_dir(&outdir)?;

    if needs_channel_normalization(&gpr_dir, args.normalize_all) {
        let changed = scans
            .iter()
            .map(|scan| normalize_channels(scan))
            .collect::<Result<Vec<bool>, PbmError>>()?
            .into_iter()
            .filter(|changed| *changed)
            .count();
        info!(
            "INFO: normalized channel {} -> {} in {} scans",
            ALTERNATE_CHANNEL, REFERENCE_CHANNEL, changed
        );
    }

    let mut comfiles = Vec::with_capacity(series.len());
    for s in &series {
        let description = write_experiment_description(s, &outdir.join(s.description_name()))?;
        let comfile =
            make_masliner_comfile(&args.tool, &description, &outdir.join(s.comfile_name()))?;
        comfiles.push(comfile);
    }

    collect_new_artifacts(&DirectoryDiff, &gpr_dir, &outdir, || {
        for comfile in &comfiles {
            run_comfile(comfile, MASLINER_JOB, &gpr_dir, args.executor)?;
        }
        Ok(())
    })
}

/// Lists the .gpr scans of `dir`, leaving out excluded file names
pub fn list_scans(dir: &Path, exclude: &[String]) -> Result<Vec<PathBuf>, PbmError> {
    let all = find_files(dir, GPR_PATTERN)?;

    for name in exclude {
        if !all.iter().any(|scan| &file_name(scan) == name) {
            warn!(
                "WARN: excluded scan {} is not in {}",
                name,
                dir.display()
            );
        }
    }

    let scans: Vec<PathBuf> = all
        .into_iter()
        .filter(|scan| !exclude.contains(&file_name(scan)))
        .collect();

    if scans.is_empty() {
        return Err(PbmError::MissingInput {
            dir: dir.to_path_buf(),
            pattern: GPR_PATTERN.to_string(),
        });
    }

    Ok(scans)
}

/// Buckets scans by slide and chamber; scans inside a chamber are naturally
/// sorted so the lowest intensity comes first
pub fn group_scans(scans: &[PathBuf]) -> Result<Vec<ScanSeries>, PbmError> {
    let mut buckets: BTreeMap<String, BTreeMap<String, Vec<PathBuf>>> = BTreeMap::new();

    for scan in scans {
        let name = file_name(scan);
        let chamber = chamber_suffix(&name).ok_or_else(|| {
            PbmError::InvalidInput(format!("scan name {} is too short to carry a chamber", name))
        })?;

        buckets
            .entry(series_key(&name).to_string())
            .or_default()
            .entry(chamber.to_string())
            .or_default()
            .push(scan.clone());
    }

    Ok(buckets
        .into_iter()
        .map(|(key, chambers)| ScanSeries {
            key,
            chambers: chambers
                .into_iter()
                .map(|(chamber, mut scans)| {
                    natural_sort(&mut scans);
                    ChamberGroup { chamber, scans }
                })
                .collect(),
        })
        .collect())
}

/// Writes the experiment description masliner reads for one series
pub fn write_experiment_description(
    series: &ScanSeries,
    path: &Path,
) -> Result<PathBuf, PbmError> {
    let mut lines = Vec::new();
    for group in &series.chambers {
        lines.extend(DESCRIPTION_HEADER.iter().map(|line| line.to_string()));
        lines.extend(group.scans.iter().map(file_name));
        lines.push(String::new());
    }

    write_collection(path, lines)
}

pub fn make_masliner_comfile(
    tool: &str,
    description: &Path,
    comfile: &Path,
) -> Result<PathBuf, PbmError> {
    Comfile::new(tool).arg("-i", description).write(comfile)
}

/// Whether scans in `dir` need the 647 -> 635 label rewrite
pub fn needs_channel_normalization(dir: &Path, normalize_all: bool) -> bool {
    let name = file_name(dir);
    normalize_all || name.contains(REFERENCE_CHANNEL) || name.contains(ALTERNATE_CHANNEL)
}

/// Rewrites the channel labels in the header lines of a scan so every scan
/// uses the reference channel; returns whether the file changed
pub fn normalize_channels(scan: &Path) -> Result<bool, PbmError> {
    let contents = std::fs::read_to_string(scan)?;

    let mut changed = false;
    let mut normalized = String::with_capacity(contents.len());
    for line in contents.split_inclusive('\n') {
        if line.starts_with('"') {
            let mut relabeled = line.to_string();
            for prefix in CHANNEL_PREFIXES {
                relabeled = relabeled.replace(
                    &format!("{}{}", prefix, ALTERNATE_CHANNEL),
                    &format!("{}{}", prefix, REFERENCE_CHANNEL),
                );
            }
            changed |= relabeled != line;
            normalized.push_str(&relabeled);
        } else {
            normalized.push_str(line);
        }
    }

    if changed {
        std::fs::write(scan, normalized)?;
    }

    Ok(changed)
}

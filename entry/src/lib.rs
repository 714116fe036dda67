//! pbmtools: preprocessing pipeline for protein-binding microarray scans
//!
//! A run takes the raw GenePix scans of every wavelength through four
//! stages, each backed by an external tool:
//!
//! - pbm-masliner: merge the scans taken at several intensities
//! - pbm-detrend: spatially detrend the highest-intensity merged scan
//! - pbm-average: average replicate probes three ways
//! - pbm-matrix: pool the averages of every wavelength into data matrices
//!
//! The analysis file of the array design is located (or built by
//! pbm-analysis) before anything else. Every stage writes into a fresh
//! directory and nothing is ever overwritten, so a failed run is resumed by
//! removing the directories of the failed stage and calling the stage tools
//! by hand.

use anyhow::Context;
use log::info;

use std::path::{Path, PathBuf};

use config::{
    find_files, prevent_overwrite, ArgCheck, Executor, RunDescriptor, StageDescriptor, StageType,
    AVERAGE_DIR, AVERAGE_TOOL, DETREND_DIR, DETREND_TOOL, MAKE_ANALYSIS_TOOL, MASLINER_DIR,
    MASLINER_TOOL, MATRIX_TOOL, QUALITY_TOKEN, RUN_DESCRIPTOR,
};

pub mod cli;

use cli::{Layout, RunArgs};

/// Command lines of the external stage tools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTools {
    pub analysis: String,
    pub masliner: String,
    pub detrend: String,
    pub average: String,
    pub matrix: String,
}

impl Default for StageTools {
    fn default() -> Self {
        Self {
            analysis: MAKE_ANALYSIS_TOOL.to_string(),
            masliner: MASLINER_TOOL.to_string(),
            detrend: DETREND_TOOL.to_string(),
            average: AVERAGE_TOOL.to_string(),
            matrix: MATRIX_TOOL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub prefix: String,
    pub executor: Executor,
    pub exclude: Vec<String>,
    pub threshold: Option<f64>,
    pub quality_token: String,
    pub normalize_all: bool,
    pub tools: StageTools,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            executor: Executor::default(),
            exclude: Vec::new(),
            threshold: None,
            quality_token: QUALITY_TOKEN.to_string(),
            normalize_all: false,
            tools: StageTools::default(),
        }
    }
}

impl From<&RunArgs> for PipelineOptions {
    fn from(args: &RunArgs) -> Self {
        Self {
            prefix: args.prefix.clone(),
            executor: args.executor,
            exclude: args.exclude.clone(),
            threshold: args.threshold,
            quality_token: args.quality_token.clone(),
            normalize_all: args.normalize_all,
            tools: StageTools {
                analysis: args.analysis_tool.clone(),
                masliner: args.masliner_tool.clone(),
                detrend: args.detrend_tool.clone(),
                average: args.average_tool.clone(),
                matrix: args.matrix_tool.clone(),
            },
        }
    }
}

/// Runs the `run` subcommand
pub fn lib(args: &RunArgs) -> anyhow::Result<PathBuf> {
    let layout = args.layout()?;
    run_pipeline(&layout, &PipelineOptions::from(args))
}

/// Runs every stage in order and records what each one produced
///
/// # Arguments
///
/// * `layout` - analysis directory, scan directories and output directory
/// * `options` - matrix prefix, executor and stage settings
///
/// # Returns
///
/// * `anyhow::Result<PathBuf>` - path to the run descriptor
///
/// # Example
///
/// ```rust, no_run
/// use pbmtools::{cli::Layout, run_pipeline, PipelineOptions};
/// use std::path::{Path, PathBuf};
///
/// let scans = vec![PathBuf::from("/data/488"), PathBuf::from("/data/635")];
/// let layout = Layout {
///     analysis_dir: Path::new("/data/design"),
///     scan_dirs: &scans,
///     output_dir: Path::new("/data/matrices"),
/// };
///
/// run_pipeline(&layout, &PipelineOptions::default()).unwrap();
/// ```
pub fn run_pipeline(layout: &Layout, options: &PipelineOptions) -> anyhow::Result<PathBuf> {
    let output_dir = std::path::absolute(layout.output_dir)?;
    std::fs::create_dir_all(&output_dir)?;

    let descriptor_path = output_dir.join(format!("{}{}", options.prefix, RUN_DESCRIPTOR));
    prevent_overwrite(&descriptor_path)?;

    let mut descriptor = RunDescriptor::new(options.executor);

    let analysis = resolve_analysis(layout.analysis_dir, options)?;
    descriptor.analysis_file = Some(analysis.clone());
    descriptor.push(
        StageDescriptor::new(StageType::AnalysisFile, layout.analysis_dir)
            .with_inputs(vec![layout.analysis_dir.to_path_buf()])
            .with_artifacts(vec![analysis.clone()]),
    );

    let mut avg_dirs = Vec::with_capacity(layout.scan_dirs.len());
    for scan_dir in layout.scan_dirs {
        info!("INFO: preprocessing scans in {}", scan_dir.display());
        let scan_dir = scan_dir
            .canonicalize()
            .with_context(|| format!("ERROR: Could not read scan directory {:?}", scan_dir))?;

        let madj_dir = scan_dir.join(MASLINER_DIR);
        let adjusted = run_masliner(&scan_dir, &madj_dir, options)?;
        descriptor.push(
            StageDescriptor::new(StageType::Masliner, &madj_dir)
                .with_inputs(vec![scan_dir.clone()])
                .with_artifacts(adjusted),
        );

        let norm_dir = scan_dir.join(DETREND_DIR);
        let normalized = run_detrend(&madj_dir, &analysis, &norm_dir, options)?;
        descriptor.push(
            StageDescriptor::new(StageType::SpatialDetrend, &norm_dir)
                .with_inputs(vec![madj_dir.clone(), analysis.clone()])
                .with_artifacts(normalized),
        );

        let avg_dir = run_average(&norm_dir, &scan_dir.join(AVERAGE_DIR), options)?;
        descriptor.push(
            StageDescriptor::new(StageType::AverageProbes, &avg_dir)
                .with_inputs(vec![norm_dir.clone()])
                .with_artifacts(find_files(&avg_dir, "*")?),
        );

        avg_dirs.push(avg_dir);
    }

    let matrices = run_matrix(&avg_dirs, &output_dir, options)?;
    descriptor.push(
        StageDescriptor::new(StageType::DataMatrix, &output_dir)
            .with_inputs(avg_dirs)
            .with_artifacts(matrices),
    );

    let written = descriptor.write(&descriptor_path)?;
    info!("SUCCESS: run descriptor written to {}", written.display());

    Ok(written)
}

fn resolve_analysis(dir: &Path, options: &PipelineOptions) -> anyhow::Result<PathBuf> {
    let args = pbm_analysis::cli::Args {
        dir: dir.to_path_buf(),
        tool: options.tools.analysis.clone(),
    };

    pbm_analysis::core::resolve_analysis_file(&args)
        .with_context(|| format!("ERROR: Failed to resolve the analysis file in {:?}", dir))
}

fn run_masliner(
    scan_dir: &Path,
    madj_dir: &Path,
    options: &PipelineOptions,
) -> anyhow::Result<Vec<PathBuf>> {
    let args = pbm_masliner::cli::Args {
        gpr_dir: scan_dir.to_path_buf(),
        outdir: Some(madj_dir.to_path_buf()),
        exclude: options.exclude.clone(),
        normalize_all: options.normalize_all,
        executor: options.executor,
        tool: options.tools.masliner.clone(),
    };

    pbm_masliner::core::masliner(&args)
        .with_context(|| format!("ERROR: Failed to run masliner on {:?}", scan_dir))
}

fn run_detrend(
    madj_dir: &Path,
    analysis: &Path,
    norm_dir: &Path,
    options: &PipelineOptions,
) -> anyhow::Result<Vec<PathBuf>> {
    let args = pbm_detrend::cli::Args {
        madj_dir: madj_dir.to_path_buf(),
        analysis: analysis.to_path_buf(),
        outdir: Some(norm_dir.to_path_buf()),
        threshold: options.threshold,
        quality_token: options.quality_token.clone(),
        executor: options.executor,
        tool: options.tools.detrend.clone(),
    };

    pbm_detrend::core::spatial_detrend(&args)
        .with_context(|| format!("ERROR: Failed to detrend {:?}", madj_dir))
}

fn run_average(
    norm_dir: &Path,
    avg_dir: &Path,
    options: &PipelineOptions,
) -> anyhow::Result<PathBuf> {
    let args = pbm_average::cli::Args {
        norm_dir: norm_dir.to_path_buf(),
        outdir: Some(avg_dir.to_path_buf()),
        executor: options.executor,
        tool: options.tools.average.clone(),
    };

    pbm_average::core::average_probes(&args)
        .with_context(|| format!("ERROR: Failed to average probes of {:?}", norm_dir))
}

fn run_matrix(
    avg_dirs: &[PathBuf],
    output_dir: &Path,
    options: &PipelineOptions,
) -> anyhow::Result<Vec<PathBuf>> {
    let args = pbm_matrix::cli::Args {
        avg_dirs: avg_dirs.to_vec(),
        outdir: output_dir.to_path_buf(),
        prefix: options.prefix.clone(),
        executor: options.executor,
        tool: options.tools.matrix.clone(),
    };

    pbm_matrix::core::build_data_matrices(&args)
        .with_context(|| format!("ERROR: Failed to build data matrices in {:?}", output_dir))
}

/// Validates the run arguments and creates the output directory
///
/// Returns the run log path. Nothing is created when the layout or an input
/// directory is wrong.
pub fn prepare_run_log(args: &RunArgs) -> anyhow::Result<PathBuf> {
    args.check()?;

    let layout = args.layout()?;
    std::fs::create_dir_all(layout.output_dir)?;

    Ok(args.log_file()?)
}

/// Sends log records to stderr and to `log_file`, stamped with local time
///
/// # Example
///
/// ```rust, no_run
/// pbmtools::init_run_logger(std::path::Path::new("/data/matrices/preprocess.log")).unwrap();
/// ```
pub fn init_run_logger(log_file: &Path) -> anyhow::Result<()> {
    prevent_overwrite(log_file)?;

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stderr())
        .chain(fern::log_file(log_file)?)
        .apply()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_args(paths: &[&Path]) -> RunArgs {
        RunArgs::from(
            paths
                .iter()
                .map(|path| path.to_string_lossy().to_string())
                .collect(),
        )
    }

    #[test]
    fn test_mistyped_scan_dir_leaves_nothing_behind() {
        let root = tempdir().unwrap();
        let analysis = root.path().join("design");
        std::fs::create_dir(&analysis).unwrap();
        let output = root.path().join("matrices");

        let args = run_args(&[&analysis, &root.path().join("scans_4888"), &output]);
        assert!(prepare_run_log(&args).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_run_log_sits_in_the_output_dir() {
        let root = tempdir().unwrap();
        let analysis = root.path().join("design");
        let scans = root.path().join("scans_488");
        std::fs::create_dir(&analysis).unwrap();
        std::fs::create_dir(&scans).unwrap();
        let output = root.path().join("matrices");

        let log_file = prepare_run_log(&run_args(&[&analysis, &scans, &output])).unwrap();
        assert!(output.is_dir());
        assert_eq!(log_file, output.join(config::LOG_FILE));
        assert!(!log_file.exists());
    }
}

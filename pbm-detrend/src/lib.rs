//! Core module for spatial detrending of masliner-adjusted PBM scans
//!
//! Probe intensities drift across the surface of an array. For every chamber
//! only the highest-intensity masliner file is kept (the naturally-last one),
//! the selection is listed in a manifest and a single detrending job
//! normalizes it against the analysis file of the design.
//!
//! When a quality threshold is given, the metric the detrending tool prints
//! in its job log is checked after the run and the stage fails if any value
//! falls below it.

use std::path::PathBuf;

use anyhow::Context;
use config::ArgCheck;

pub mod cli;
pub mod core;

pub fn lib_pbm_detrend(args: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let args = cli::Args::from(args);
    args.check()?;

    let normalized = crate::core::spatial_detrend(&args)
        .with_context(|| format!("ERROR: Failed to detrend {:?}", args.madj_dir))?;

    Ok(normalized)
}

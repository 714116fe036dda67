//! Core module for building PBM data matrices
//!
//! The averaged probe files of every scan wavelength are pooled per matrix
//! tag and handed to the matrix tool, one job per tag:
//!
//! - `or`: probes averaged across orientations
//! - `br`: best replicate pair
//! - `o1` / `o2`: per-orientation averages, split by their `o1match` and
//!   `o2match` names
//!
//! A tag that found no files is skipped.

use std::path::PathBuf;

use anyhow::Context;
use config::ArgCheck;

pub mod cli;
pub mod core;

pub fn lib_pbm_matrix(args: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let args = cli::Args::from(args);
    args.check()?;

    let matrices = crate::core::build_data_matrices(&args)
        .with_context(|| format!("ERROR: Failed to build data matrices in {:?}", args.outdir))?;

    Ok(matrices)
}

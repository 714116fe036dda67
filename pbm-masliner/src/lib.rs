//! Core module for merging PBM scans taken at several intensities
//!
//! A single scan intensity either saturates the brightest probes or
//! under-exposes the dimmest ones, so every slide is scanned several times.
//! masliner merges those scans into one higher-dynamic-range measurement per
//! chamber.
//!
//! In short, the scans of a directory are bucketed by slide barcode and by
//! chamber (the last 7 characters of the file name), an experiment
//! description is written per slide, and one masliner job is submitted per
//! description. Every file the jobs leave in the scan directory is then
//! moved into the masliner output directory for the detrending stage.

use std::path::PathBuf;

use anyhow::Context;
use config::ArgCheck;

pub mod cli;
pub mod core;

pub fn lib_pbm_masliner(args: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let args = cli::Args::from(args);
    args.check()?;

    let adjusted = crate::core::masliner(&args)
        .with_context(|| format!("ERROR: Failed to run masliner on {:?}", args.gpr_dir))?;

    Ok(adjusted)
}

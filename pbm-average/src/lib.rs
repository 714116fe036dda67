//! Core module for averaging replicate probes
//!
//! Every probe is printed several times on an array and in both
//! orientations. The detrended files are listed in a manifest and averaged
//! three ways: across orientations (`or`), over the best replicate pair
//! (`br`) and per orientation (`r`). Each variant is its own job, run in the
//! averaging directory where the tool writes its outputs.

use std::path::PathBuf;

use anyhow::Context;
use config::ArgCheck;

pub mod cli;
pub mod core;

pub fn lib_pbm_average(args: Vec<String>) -> anyhow::Result<PathBuf> {
    let args = cli::Args::from(args);
    args.check()?;

    let avg_dir = crate::core::average_probes(&args)
        .with_context(|| format!("ERROR: Failed to average probes of {:?}", args.norm_dir))?;

    Ok(avg_dir)
}

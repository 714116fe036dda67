//! Core module for locating or building the analysis file of a PBM design
//!
//! The analysis file maps every probe of an array design to its sequence
//! and is needed by the spatial detrending stage. Most designs already have
//! one sitting next to the design files; when a directory has none, it is
//! built by the external analysis-file builder from three convention-named
//! inputs: the *DNAFront_BCBottom*.tdt design, the *SequenceList*.txt probe
//! sequences and any .gpr scan of that design.

use std::path::PathBuf;

use anyhow::Context;
use config::ArgCheck;

pub mod cli;
pub mod core;

pub fn lib_pbm_analysis(args: Vec<String>) -> anyhow::Result<PathBuf> {
    let args = cli::Args::from(args);
    args.check()?;

    let analysis = crate::core::resolve_analysis_file(&args)
        .with_context(|| format!("ERROR: Failed to resolve analysis file in {:?}", args.dir))?;

    Ok(analysis)
}

//! Core module for locating or building the analysis file of a PBM design
//!
//! Prints the path of the analysis file found (or generated) in --dir.

use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_analysis::{cli::Args, core::resolve_analysis_file};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let analysis = resolve_analysis_file(&args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });
    println!("{}", analysis.display());

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

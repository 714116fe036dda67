use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_matrix::{cli::Args, core::build_data_matrices};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let matrices = build_data_matrices(&args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });
    for matrix in matrices {
        info!("Data matrix: {}", matrix.display());
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

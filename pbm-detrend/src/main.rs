use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_detrend::{cli::Args, core::spatial_detrend};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let normalized = spatial_detrend(&args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });
    info!("Spatial detrending produced {} files", normalized.len());

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_average::{cli::Args, core::average_probes};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let avg_dir = average_probes(&args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });
    info!("Averaged probes written to {}", avg_dir.display());

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

use clap::Parser;
use config::ArgCheck;
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_masliner::{cli::Args, core::masliner};

fn main() {
    let start = std::time::Instant::now();
    init_with_level(Level::Info).unwrap();

    let args: Args = Args::parse();
    args.check().unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });

    let adjusted = masliner(&args).unwrap_or_else(|e| {
        error!("{}", e);
        std::process::exit(1);
    });
    info!("Masliner produced {} files", adjusted.len());

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

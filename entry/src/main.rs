/// pbmtools: preprocessing pipeline for protein-binding microarray scans
///
/// This is the entry point for the pbmtools CLI.
/// It parses the CLI arguments and either runs the
/// whole pipeline or a single stage [pbm-tool].
///
/// This wrapper offers 6 different subcommands:
/// - run
/// - pbm-analysis
/// - pbm-masliner
/// - pbm-detrend
/// - pbm-average
/// - pbm-matrix
///
/// Stage subcommands forward everything after them to the
/// stage tool, so a single stage is re-run with e.g.:
///
/// ```shell
/// pbmtools pbm-detrend -- --madj-dir 488/masliner --analysis ID_x_genomic_analysis.txt --threshold 0.9
/// ```
///
use clap::{Args, Parser, Subcommand};
use log::{error, info, Level};
use simple_logger::init_with_level;

use pbm_analysis::lib_pbm_analysis;
use pbm_average::lib_pbm_average;
use pbm_detrend::lib_pbm_detrend;
use pbm_masliner::lib_pbm_masliner;
use pbm_matrix::lib_pbm_matrix;
use pbmtools::{cli::RunArgs, init_run_logger, lib, prepare_run_log};

#[derive(Parser)]
#[command(name = "pbmtools")]
#[command(about = "pbmtools: preprocessing pipeline for protein-binding microarray scans")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "run")]
    Run(RunArgs),
    #[command(name = "pbm-analysis")]
    Analysis(PbmArgs),
    #[command(name = "pbm-masliner")]
    Masliner(PbmArgs),
    #[command(name = "pbm-detrend")]
    Detrend(PbmArgs),
    #[command(name = "pbm-average")]
    Average(PbmArgs),
    #[command(name = "pbm-matrix")]
    Matrix(PbmArgs),
}

#[derive(Args)]
struct PbmArgs {
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() {
    let start = std::time::Instant::now();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run(args) => start_run_logger(args),
        _ => init_with_level(Level::Info).unwrap(),
    }
    init();

    let result = match cli.command {
        Commands::Run(args) => {
            lib(&args).map(|descriptor| info!("Run descriptor: {}", descriptor.display()))
        }
        Commands::Analysis(args) => lib_pbm_analysis(args.args)
            .map(|analysis| info!("Analysis file: {}", analysis.display())),
        Commands::Masliner(args) => lib_pbm_masliner(args.args)
            .map(|adjusted| info!("Masliner produced {} files", adjusted.len())),
        Commands::Detrend(args) => lib_pbm_detrend(args.args)
            .map(|normalized| info!("Detrending produced {} files", normalized.len())),
        Commands::Average(args) => lib_pbm_average(args.args)
            .map(|avg_dir| info!("Averaged probes in {}", avg_dir.display())),
        Commands::Matrix(args) => lib_pbm_matrix(args.args)
            .map(|matrices| info!("Built {} data matrices", matrices.len())),
    };

    if let Err(e) = result {
        error!("{:?}", e);
        std::process::exit(1);
    }

    let elapsed = start.elapsed();
    info!("Elapsed time: {:.3?}", elapsed);
}

/// Arguments are checked before the output directory and the run log exist
fn start_run_logger(args: &RunArgs) {
    let started = prepare_run_log(args).and_then(|log_file| init_run_logger(&log_file));

    if let Err(e) = started {
        eprintln!("ERROR: {:?}", e);
        std::process::exit(1);
    }
}

fn init() {
    let message = format!(
        r#"

        pbmtools: preprocessing pipeline for protein-binding microarray scans

        this is the entry point for the pbmtools CLI
        and it is responsible for running the pipeline
        or one of its stages:

        - pbm-analysis
        - pbm-masliner
        - pbm-detrend
        - pbm-average
        - pbm-matrix

        > version: {}

        * to get help on the subcommands, run:
            pbmtools <SUBCOMMAND> -- --help

        "#,
        env!("CARGO_PKG_VERSION")
    );

    info!("{}", message);
}

use clap::Parser;
use config::{ArgCheck, Executor, AVERAGE_TOOL};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Average replicate probes of detrended PBM scans")]
pub struct Args {
    #[arg(
        short = 'n',
        long = "norm-dir",
        required = true,
        value_name = "PATH",
        help = "Directory with the detrended norm_madj*.gpr files"
    )]
    pub norm_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "outdir",
        required = false,
        value_name = "PATH",
        help = "Output directory [default: average_probes next to --norm-dir]"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(
        short = 'e',
        long = "executor",
        value_name = "EXECUTOR",
        help = "How to run the averaging comfiles",
        value_enum,
        default_value_t = Executor::Qsub
    )]
    pub executor: Executor,

    #[arg(
        long = "tool",
        required = false,
        value_name = "COMMAND",
        help = "Command line of the probe averaging tool",
        default_value = AVERAGE_TOOL
    )]
    pub tool: String,
}

impl Args {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec![env!("CARGO_PKG_NAME").to_string()];
        full_args.extend(args);

        Args::parse_from(full_args)
    }
}

impl ArgCheck for Args {
    fn get_input_dirs(&self) -> Vec<&PathBuf> {
        vec![&self.norm_dir]
    }
}

use clap::{ArgAction, Parser};
use config::{ArgCheck, Executor, MASLINER_TOOL};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Merge PBM scans taken at several intensities with masliner")]
pub struct Args {
    #[arg(
        short = 'g',
        long = "gpr-dir",
        required = true,
        value_name = "PATH",
        help = "Directory with the .gpr scans of one wavelength"
    )]
    pub gpr_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "outdir",
        required = false,
        value_name = "PATH",
        help = "Output directory for masliner results [default: <gpr-dir>/masliner]"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(
        short = 'x',
        long = "exclude",
        required = false,
        value_name = "NAMES",
        value_delimiter = ',',
        num_args = 1..,
        help = "Scan file names to leave out, delimited by comma"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long = "normalize-all",
        help = "Normalize the 647 channel label to 635 regardless of the directory name",
        action = ArgAction::SetTrue
    )]
    pub normalize_all: bool,

    #[arg(
        short = 'e',
        long = "executor",
        value_name = "EXECUTOR",
        help = "How to run the masliner comfiles",
        value_enum,
        default_value_t = Executor::Qsub
    )]
    pub executor: Executor,

    #[arg(
        long = "tool",
        required = false,
        value_name = "COMMAND",
        help = "Command line of the masliner tool",
        default_value = MASLINER_TOOL
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
        vec![&self.gpr_dir]
    }
}

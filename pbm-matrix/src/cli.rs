use clap::Parser;
use config::{ArgCheck, Executor, MATRIX_TOOL};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Build data matrices from averaged PBM probe files")]
pub struct Args {
    #[arg(
        short = 'a',
        long = "avg-dirs",
        required = true,
        value_name = "PATHS",
        value_delimiter = ',',
        num_args = 1..,
        help = "Averaging directories to collect probe files from, delimited by comma"
    )]
    pub avg_dirs: Vec<PathBuf>,

    #[arg(
        short = 'o',
        long = "outdir",
        required = true,
        value_name = "PATH",
        help = "Output directory for the data matrices"
    )]
    pub outdir: PathBuf,

    #[arg(
        short = 'p',
        long = "prefix",
        required = false,
        value_name = "PREFIX",
        help = "Prefix of every data matrix file name",
        default_value = ""
    )]
    pub prefix: String,

    #[arg(
        short = 'e',
        long = "executor",
        value_name = "EXECUTOR",
        help = "How to run the data matrix comfiles",
        value_enum,
        default_value_t = Executor::Qsub
    )]
    pub executor: Executor,

    #[arg(
        long = "tool",
        required = false,
        value_name = "COMMAND",
        help = "Command line of the data matrix tool",
        default_value = MATRIX_TOOL
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
        self.avg_dirs.iter().collect()
    }
}

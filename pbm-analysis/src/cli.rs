use clap::Parser;
use config::{ArgCheck, MAKE_ANALYSIS_TOOL};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Locate or build the analysis file of a PBM array design")]
pub struct Args {
    #[arg(
        short = 'd',
        long = "dir",
        required = true,
        value_name = "PATH",
        help = "Directory holding *analysis*.txt, or the design, sequence and .gpr files to build one"
    )]
    pub dir: PathBuf,

    #[arg(
        long = "tool",
        required = false,
        value_name = "COMMAND",
        help = "Command line of the analysis-file builder",
        default_value = MAKE_ANALYSIS_TOOL
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
        vec![&self.dir]
    }
}

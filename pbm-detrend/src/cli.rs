use clap::Parser;
use config::{ArgCheck, Executor, DETREND_TOOL, QUALITY_TOKEN};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Spatially detrend masliner-adjusted PBM scans")]
pub struct Args {
    #[arg(
        short = 'm',
        long = "madj-dir",
        required = true,
        value_name = "PATH",
        help = "Directory with the masliner adjusted madj*.gpr files"
    )]
    pub madj_dir: PathBuf,

    #[arg(
        short = 'a',
        long = "analysis",
        required = true,
        value_name = "PATH",
        help = "Analysis file of the array design"
    )]
    pub analysis: PathBuf,

    #[arg(
        short = 'o',
        long = "outdir",
        required = false,
        value_name = "PATH",
        help = "Output directory [default: spatial_detrend next to --madj-dir]"
    )]
    pub outdir: Option<PathBuf>,

    #[arg(
        long = "threshold",
        required = false,
        value_name = "VALUE",
        help = "Fail when the quality metric reported by the detrending job is below this value"
    )]
    pub threshold: Option<f64>,

    #[arg(
        long = "quality-token",
        required = false,
        value_name = "TOKEN",
        help = "Token preceding the quality metric in the job log",
        default_value = QUALITY_TOKEN
    )]
    pub quality_token: String,

    #[arg(
        short = 'e',
        long = "executor",
        value_name = "EXECUTOR",
        help = "How to run the detrending comfile",
        value_enum,
        default_value_t = Executor::Qsub
    )]
    pub executor: Executor,

    #[arg(
        long = "tool",
        required = false,
        value_name = "COMMAND",
        help = "Command line of the spatial detrending tool",
        default_value = DETREND_TOOL
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
        vec![&self.madj_dir]
    }

    fn get_input_files(&self) -> Vec<&PathBuf> {
        vec![&self.analysis]
    }
}

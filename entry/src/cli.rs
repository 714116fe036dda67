use clap::{ArgAction, Parser};
use config::{
    ArgCheck, CliError, Executor, AVERAGE_TOOL, DETREND_TOOL, MAKE_ANALYSIS_TOOL, MASLINER_TOOL,
    MATRIX_TOOL, QUALITY_TOKEN,
};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(version, about = "Run the full PBM preprocessing pipeline")]
pub struct RunArgs {
    #[arg(
        required = true,
        num_args = 3..,
        value_name = "PATHS",
        help = "<ANALYSIS_DIR> <SCAN_DIRS>... <OUTPUT_DIR>: analysis-file directory, one scan directory per wavelength and the data matrix directory"
    )]
    pub paths: Vec<PathBuf>,

    #[arg(
        short = 'p',
        long = "prefix",
        required = false,
        value_name = "PREFIX",
        help = "Prefix of the data matrix, descriptor and log file names",
        default_value = ""
    )]
    pub prefix: String,

    #[arg(
        short = 'e',
        long = "executor",
        value_name = "EXECUTOR",
        help = "How to run every stage job",
        value_enum,
        default_value_t = Executor::Qsub
    )]
    pub executor: Executor,

    #[arg(
        short = 'x',
        long = "exclude",
        required = false,
        value_name = "NAMES",
        value_delimiter = ',',
        num_args = 1..,
        help = "Scan file names to leave out of masliner, delimited by comma"
    )]
    pub exclude: Vec<String>,

    #[arg(
        long = "threshold",
        required = false,
        value_name = "VALUE",
        help = "Stop when the detrending quality metric falls below this value"
    )]
    pub threshold: Option<f64>,

    #[arg(
        long = "quality-token",
        required = false,
        value_name = "TOKEN",
        help = "Token preceding the quality metric in the detrending job log",
        default_value = QUALITY_TOKEN
    )]
    pub quality_token: String,

    #[arg(
        long = "normalize-all",
        help = "Normalize the 647 channel label in every scan directory",
        action = ArgAction::SetTrue
    )]
    pub normalize_all: bool,

    #[arg(
        short = 'l',
        long = "log",
        required = false,
        value_name = "PATH",
        help = "Run log file [default: <OUTPUT_DIR>/<PREFIX>preprocess.log]"
    )]
    pub log: Option<PathBuf>,

    #[arg(long = "analysis-tool", hide = true, default_value = MAKE_ANALYSIS_TOOL)]
    pub analysis_tool: String,

    #[arg(long = "masliner-tool", hide = true, default_value = MASLINER_TOOL)]
    pub masliner_tool: String,

    #[arg(long = "detrend-tool", hide = true, default_value = DETREND_TOOL)]
    pub detrend_tool: String,

    #[arg(long = "average-tool", hide = true, default_value = AVERAGE_TOOL)]
    pub average_tool: String,

    #[arg(long = "matrix-tool", hide = true, default_value = MATRIX_TOOL)]
    pub matrix_tool: String,
}

/// Directories a run reads from and writes to
#[derive(Debug, Clone, Copy)]
pub struct Layout<'a> {
    pub analysis_dir: &'a Path,
    pub scan_dirs: &'a [PathBuf],
    pub output_dir: &'a Path,
}

impl RunArgs {
    pub fn from(args: Vec<String>) -> Self {
        let mut full_args = vec!["run".to_string()];
        full_args.extend(args);

        RunArgs::parse_from(full_args)
    }

    /// Splits the positional paths into analysis, scan and output directories
    pub fn layout(&self) -> Result<Layout<'_>, CliError> {
        let missing = || {
            CliError::InvalidInput(
                "Expected <ANALYSIS_DIR> <SCAN_DIRS>... <OUTPUT_DIR>".to_string(),
            )
        };

        let (analysis_dir, rest) = self.paths.split_first().ok_or_else(missing)?;
        let (output_dir, scan_dirs) = rest.split_last().ok_or_else(missing)?;
        if scan_dirs.is_empty() {
            return Err(missing());
        }

        Ok(Layout {
            analysis_dir,
            scan_dirs,
            output_dir,
        })
    }

    pub fn log_file(&self) -> Result<PathBuf, CliError> {
        match &self.log {
            Some(log) => Ok(log.clone()),
            None => Ok(self
                .layout()?
                .output_dir
                .join(format!("{}{}", self.prefix, config::LOG_FILE))),
        }
    }
}

impl ArgCheck for RunArgs {
    fn check(&self) -> Result<(), CliError> {
        self.layout()?;
        self.validate_args()
    }

    fn get_input_dirs(&self) -> Vec<&PathBuf> {
        match self.paths.split_last() {
            Some((_, inputs)) => inputs.iter().collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_splits_positional_paths() {
        let args = RunArgs::from(
            ["/a", "/s488", "/s635", "/out", "-p", "exp1_", "-e", "local"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        );

        let layout = args.layout().unwrap();
        assert_eq!(layout.analysis_dir, Path::new("/a"));
        assert_eq!(
            layout.scan_dirs,
            &[PathBuf::from("/s488"), PathBuf::from("/s635")]
        );
        assert_eq!(layout.output_dir, Path::new("/out"));
        assert_eq!(args.executor, Executor::Local);
        assert_eq!(
            args.log_file().unwrap(),
            PathBuf::from("/out/exp1_preprocess.log")
        );
    }

    #[test]
    fn test_too_few_paths_are_rejected() {
        assert!(RunArgs::try_parse_from(["run", "/a", "/out"]).is_err());
    }

    #[test]
    fn test_missing_scan_dir_fails_check() {
        let args = RunArgs::from(vec![
            "/definitely/not/here".to_string(),
            "/nor/here".to_string(),
            "/out".to_string(),
        ]);
        assert!(args.check().is_err());
    }
}

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{PbmError, CHAMBER_SUFFIX_LEN, SERIES_DELIMITER};

// os
#[cfg(not(windows))]
const TICK_SETTINGS: (&str, u64) = ("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ", 80);
#[cfg(windows)]
const TICK_SETTINGS: (&str, u64) = (r"+-x| ", 200);

/// return a pre-configured spinner for blocking job submissions
pub fn get_spinner(msg: &str) -> ProgressBar {
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars(TICK_SETTINGS.0)
        .template(" {spinner} {msg:<30} {elapsed_precise} ")
        .expect("no template error");

    let spinner = ProgressBar::new_spinner();

    spinner.set_style(spinner_style);
    spinner.enable_steady_tick(Duration::from_millis(TICK_SETTINGS.1));
    spinner.set_message(msg.to_owned());

    spinner
}

/// Fails if `path` already exists
///
/// Every generated file or directory goes through this check before it is
/// written, so a run never merges its artifacts with a previous one.
///
/// # Example
///
/// ```rust, no_run
/// use config::prevent_overwrite;
///
/// prevent_overwrite(std::path::Path::new("masliner.com")).unwrap();
/// ```
pub fn prevent_overwrite<P: AsRef<Path>>(path: P) -> Result<(), PbmError> {
    let path = path.as_ref();
    if path.exists() {
        return Err(PbmError::AlreadyExists(path.to_path_buf()));
    }

    Ok(())
}

/// Creates a fresh stage directory, failing if it is already there
pub fn create_stage_dir<P: AsRef<Path>>(path: P) -> Result<PathBuf, PbmError> {
    let path = path.as_ref();
    prevent_overwrite(path)?;
    std::fs::create_dir_all(path)?;

    log::info!("INFO: created stage directory {}", path.display());
    Ok(path.to_path_buf())
}

/// Finds every entry in `dir` matching a shell-style `pattern`
///
/// The directory is passed explicitly and escaped, so the current working
/// directory never matters. Results are naturally sorted.
///
/// # Example
///
/// ```rust, no_run
/// use config::find_files;
///
/// let scans = find_files("/data/488_scan", "*.gpr").unwrap();
/// ```
pub fn find_files<P: AsRef<Path>>(dir: P, pattern: &str) -> Result<Vec<PathBuf>, PbmError> {
    let dir = dir.as_ref();
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}/{}", escaped.trim_end_matches('/'), pattern);

    let mut files = glob::glob(&full)?.collect::<Result<Vec<PathBuf>, _>>()?;
    natural_sort(&mut files);

    Ok(files)
}

/// Sorts paths by file name with numeric-aware ordering
pub fn natural_sort(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natord::compare(&file_name(a), &file_name(b)).then_with(|| a.cmp(b)));
}

/// Returns the final component of a path as an owned string
pub fn file_name<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Returns the chamber suffix of a scan file name (e.g. `1-8.gpr`)
pub fn chamber_suffix(name: &str) -> Option<&str> {
    let count = name.chars().count();
    if count < CHAMBER_SUFFIX_LEN {
        return None;
    }

    let (idx, _) = name.char_indices().nth(count - CHAMBER_SUFFIX_LEN)?;
    Some(&name[idx..])
}

/// Returns the series key of a scan file name: the slide barcode in front
/// of the first delimiter, or the whole stem when there is none
pub fn series_key(name: &str) -> &str {
    let stem = match chamber_suffix(name) {
        Some(suffix) => &name[..name.len() - suffix.len()],
        None => name,
    };

    stem.split(SERIES_DELIMITER)
        .next()
        .filter(|key| !key.is_empty())
        .unwrap_or(stem)
}

/// write a collection of lines to a fresh file
pub fn write_collection<P, I, S>(path: P, lines: I) -> Result<PathBuf, PbmError>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let path = path.as_ref();
    prevent_overwrite(path)?;

    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()?;

    Ok(path.to_path_buf())
}

/// argument checker for all subcommands
pub trait ArgCheck {
    fn check(&self) -> Result<(), CliError> {
        self.validate_args()
    }

    fn validate_args(&self) -> Result<(), CliError> {
        let dirs = self.get_input_dirs();
        if dirs.is_empty() {
            return Err(CliError::InvalidInput(
                "No input directories provided".to_string(),
            ));
        }

        for dir in dirs {
            validate_dir(dir)?;
        }

        for file in self.get_input_files() {
            validate_file(file)?;
        }

        Ok(())
    }

    fn get_input_dirs(&self) -> Vec<&PathBuf>;

    fn get_input_files(&self) -> Vec<&PathBuf> {
        Vec::new()
    }
}

/// error handling for CLI
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// directory argument validation
pub fn validate_dir(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!("{:?} does not exist", arg)));
    }

    if !arg.is_dir() {
        return Err(CliError::InvalidInput(format!(
            "{:?} is not a directory",
            arg
        )));
    }

    Ok(())
}

/// file argument validation
pub fn validate_file(arg: &PathBuf) -> Result<(), CliError> {
    if !arg.exists() {
        return Err(CliError::InvalidInput(format!("{:?} does not exist", arg)));
    }

    if !arg.is_file() {
        return Err(CliError::InvalidInput(format!("{:?} is not a file", arg)));
    }

    match std::fs::metadata(arg) {
        Ok(metadata) if metadata.len() == 0 => {
            Err(CliError::InvalidInput(format!("file {:?} is empty", arg)))
        }
        Ok(_) => Ok(()),
        Err(e) => Err(CliError::IoError(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_prevent_overwrite_blocks_existing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("masliner.com");
        std::fs::write(&path, "perl tool.pl\n").unwrap();

        let err = prevent_overwrite(&path).unwrap_err();
        assert!(matches!(err, PbmError::AlreadyExists(p) if p == path));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "perl tool.pl\n");
    }

    #[test]
    fn test_prevent_overwrite_allows_fresh_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fresh.com");

        assert!(prevent_overwrite(&path).is_ok());
        assert!(write_collection(&path, ["-i x"]).is_ok());
        assert!(write_collection(&path, ["-i y"]).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "-i x\n");
    }

    #[test]
    fn test_create_stage_dir_refuses_reuse() {
        let dir = tempdir().unwrap();
        let stage = dir.path().join("masliner");

        assert!(create_stage_dir(&stage).is_ok());
        assert!(stage.is_dir());
        assert!(matches!(
            create_stage_dir(&stage),
            Err(PbmError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_chamber_suffix_and_series_key() {
        assert_eq!(chamber_suffix("258560610008_G600_488_1-8.gpr"), Some("1-8.gpr"));
        assert_eq!(chamber_suffix("a.gpr"), None);
        assert_eq!(series_key("258560610008_G600_488_1-8.gpr"), "258560610008");
        assert_eq!(series_key("madj001_1-8.gpr"), "madj001");
    }

    #[test]
    fn test_find_files_is_natural_sorted() {
        let dir = tempdir().unwrap();
        for name in ["scan_10_1-8.gpr", "scan_9_1-8.gpr", "scan_100_1-8.gpr", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let names: Vec<String> = find_files(dir.path(), "*.gpr")
            .unwrap()
            .iter()
            .map(file_name)
            .collect();

        assert_eq!(
            names,
            vec!["scan_9_1-8.gpr", "scan_10_1-8.gpr", "scan_100_1-8.gpr"]
        );
    }

    #[test]
    fn test_find_files_escapes_directory() {
        let dir = tempdir().unwrap();
        let odd = dir.path().join("run[1]");
        std::fs::create_dir(&odd).unwrap();
        std::fs::write(odd.join("madj001_1-8.gpr"), "").unwrap();

        assert_eq!(find_files(&odd, "madj*.gpr").unwrap().len(), 1);
    }
}

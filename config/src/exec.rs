//! Command scripts, job submission and collection of tool output
//!
//! A stage never talks to an external tool directly: it writes a
//! [`Comfile`], hands it to [`run_comfile`] together with the directory the
//! tool must run in, and lets an [`ArtifactDetector`] figure out what the
//! tool produced.

use clap::ValueEnum;
use serde::Serialize;

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{get_spinner, prevent_overwrite, PbmError, QSUB, QSUB_FLAGS};

static LOCAL_JOBS: AtomicUsize = AtomicUsize::new(1);

/// How a command script is executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Executor {
    /// submit to the batch scheduler and block until the job ends
    #[default]
    Qsub,
    /// run in-process, writing scheduler-style logs next to the outputs
    Local,
}

/// A generated command script: the tool line followed by one flag per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comfile {
    tool: String,
    flags: Vec<(String, Option<String>)>,
}

impl Comfile {
    pub fn new(tool: &str) -> Self {
        Self {
            tool: tool.to_string(),
            flags: Vec::new(),
        }
    }

    /// add a `-flag value` line
    pub fn arg<S: AsRef<OsStr>>(mut self, flag: &str, value: S) -> Self {
        self.flags.push((
            flag.to_string(),
            Some(value.as_ref().to_string_lossy().to_string()),
        ));
        self
    }

    /// add a bare `-flag` line
    pub fn switch(mut self, flag: &str) -> Self {
        self.flags.push((flag.to_string(), None));
        self
    }

    pub fn render(&self) -> String {
        let mut contents = format!("{}\n", self.tool);
        for (flag, value) in &self.flags {
            match value {
                Some(value) => contents.push_str(&format!("{} {}\n", flag, value)),
                None => contents.push_str(&format!("{}\n", flag)),
            }
        }

        contents
    }

    /// writes the script to a fresh file
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf, PbmError> {
        let path = path.as_ref();
        prevent_overwrite(path)?;
        std::fs::write(path, self.render())?;

        log::info!("INFO: wrote comfile {}", path.display());
        Ok(path.to_path_buf())
    }
}

impl std::fmt::Display for Comfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", flatten(&self.render()))
    }
}

/// Joins the non-blank lines of a command script into a single command line
pub fn flatten(contents: &str) -> String {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a command script as job `job` inside `workdir`, blocking until done
///
/// # Arguments
///
/// * `comfile` - path to the command script
/// * `job` - job name; only affects log file names
/// * `workdir` - directory the tool runs in and writes its outputs to
/// * `executor` - scheduler submission or local execution
///
/// # Example
///
/// ```rust, no_run
/// use config::{run_comfile, Executor};
/// use std::path::Path;
///
/// run_comfile(Path::new("masliner.com"), "masliner", Path::new("/data/488"), Executor::Qsub).unwrap();
/// ```
pub fn run_comfile(
    comfile: &Path,
    job: &str,
    workdir: &Path,
    executor: Executor,
) -> Result<(), PbmError> {
    let line = flatten(&std::fs::read_to_string(comfile)?);
    if line.is_empty() {
        return Err(PbmError::InvalidInput(format!(
            "comfile {} is empty",
            comfile.display()
        )));
    }

    log::info!(
        "INFO: running job '{}' [{:?}] in {}",
        job,
        executor,
        workdir.display()
    );

    let spinner = get_spinner(&format!("Waiting for {}...", job));
    let result = match executor {
        Executor::Qsub => submit_qsub(&line, job, workdir),
        Executor::Local => run_local(&line, job, workdir),
    };
    spinner.finish_and_clear();

    result?;
    log::info!("SUCCESS: job '{}' finished", job);

    Ok(())
}

/// Runs a command script locally and returns its standard output
pub fn capture_comfile(comfile: &Path, workdir: &Path) -> Result<Vec<u8>, PbmError> {
    let line = flatten(&std::fs::read_to_string(comfile)?);
    let output = spawn(&line, workdir)?;
    check_output(&file_stem(comfile), &output)?;

    Ok(output.stdout)
}

fn submit_qsub(line: &str, job: &str, workdir: &Path) -> Result<(), PbmError> {
    let output = Command::new(QSUB)
        .args(QSUB_FLAGS)
        .arg("-N")
        .arg(job)
        .args(line.split_whitespace())
        .current_dir(workdir)
        .output()?;

    check_output(job, &output)
}

fn run_local(line: &str, job: &str, workdir: &Path) -> Result<(), PbmError> {
    let output = spawn(line, workdir)?;

    let id = format!(
        "{}{:03}",
        std::process::id(),
        LOCAL_JOBS.fetch_add(1, Ordering::Relaxed)
    );
    let stdout = workdir.join(format!("{}.o{}", job, id));
    let stderr = workdir.join(format!("{}.e{}", job, id));
    prevent_overwrite(&stdout)?;
    prevent_overwrite(&stderr)?;
    std::fs::write(&stdout, &output.stdout)?;
    std::fs::write(&stderr, &output.stderr)?;

    check_output(job, &output)
}

fn spawn(line: &str, workdir: &Path) -> Result<Output, PbmError> {
    let mut tokens = line.split_whitespace();
    let program = tokens
        .next()
        .ok_or_else(|| PbmError::InvalidInput("empty command line".to_string()))?;

    Ok(Command::new(program)
        .args(tokens)
        .current_dir(workdir)
        .output()?)
}

fn check_output(job: &str, output: &Output) -> Result<(), PbmError> {
    if output.status.success() {
        return Ok(());
    }

    Err(PbmError::ToolFailed {
        job: job.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Detects the artifacts an external tool created in its working directory
pub trait ArtifactDetector {
    fn detect<F>(&self, workdir: &Path, run: F) -> Result<Vec<PathBuf>, PbmError>
    where
        F: FnOnce() -> Result<(), PbmError>;
}

/// Before/after listing of the working directory
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectoryDiff;

impl DirectoryDiff {
    fn list(dir: &Path) -> Result<BTreeSet<PathBuf>, PbmError> {
        let mut entries = BTreeSet::new();
        for entry in std::fs::read_dir(dir)? {
            entries.insert(entry?.path());
        }

        Ok(entries)
    }
}

impl ArtifactDetector for DirectoryDiff {
    fn detect<F>(&self, workdir: &Path, run: F) -> Result<Vec<PathBuf>, PbmError>
    where
        F: FnOnce() -> Result<(), PbmError>,
    {
        let before = Self::list(workdir)?;
        run()?;
        let after = Self::list(workdir)?;

        Ok(after.difference(&before).cloned().collect())
    }
}

/// Runs `run` and moves everything it created in `workdir` into `outdir`
///
/// `outdir` must already exist; when it lives inside `workdir` it has to be
/// created before calling this so it is never mistaken for tool output.
///
/// # Example
///
/// ```rust, no_run
/// use config::{collect_new_artifacts, DirectoryDiff};
/// use std::path::Path;
///
/// let moved = collect_new_artifacts(&DirectoryDiff, Path::new("/data/488"), Path::new("/data/488/masliner"), || Ok(())).unwrap();
/// ```
pub fn collect_new_artifacts<D, F>(
    detector: &D,
    workdir: &Path,
    outdir: &Path,
    run: F,
) -> Result<Vec<PathBuf>, PbmError>
where
    D: ArtifactDetector,
    F: FnOnce() -> Result<(), PbmError>,
{
    let created = detector.detect(workdir, run)?;

    let mut moved = Vec::with_capacity(created.len());
    for src in created {
        if src == outdir {
            continue;
        }

        let name = src.file_name().ok_or_else(|| {
            PbmError::InvalidInput(format!("cannot relocate {}", src.display()))
        })?;
        let dest = outdir.join(name);
        prevent_overwrite(&dest)?;
        std::fs::rename(&src, &dest)?;
        moved.push(dest);
    }

    log::info!(
        "INFO: relocated {} new files into {}",
        moved.len(),
        outdir.display()
    );

    Ok(moved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_comfile_render_and_flatten() {
        let comfile = Comfile::new("perl /project/siggers/perl/GENEPIX/gpr_file_process_conc_series.pl")
            .arg("-i", "madj_gpr.list")
            .arg("-a", Path::new("/a/ID_x_genomic_analysis.txt"))
            .switch("-keep_ctrl");

        assert_eq!(
            comfile.render(),
            "perl /project/siggers/perl/GENEPIX/gpr_file_process_conc_series.pl\n\
             -i madj_gpr.list\n\
             -a /a/ID_x_genomic_analysis.txt\n\
             -keep_ctrl\n"
        );
        assert_eq!(
            comfile.to_string(),
            "perl /project/siggers/perl/GENEPIX/gpr_file_process_conc_series.pl -i madj_gpr.list -a /a/ID_x_genomic_analysis.txt -keep_ctrl"
        );
    }

    #[test]
    fn test_flatten_drops_blank_lines() {
        assert_eq!(flatten("perl avg.pl\n\n-l list\n-no_gfilter"), "perl avg.pl -l list -no_gfilter");
    }

    #[test]
    fn test_comfile_write_is_guarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.com");
        let comfile = Comfile::new("echo").arg("-i", "x");

        assert!(comfile.write(&path).is_ok());
        assert!(matches!(comfile.write(&path), Err(PbmError::AlreadyExists(_))));
    }

    #[test]
    fn test_local_run_writes_scheduler_style_logs() {
        let dir = tempdir().unwrap();
        let comfile = Comfile::new("echo").arg("-i", "hello").write(dir.path().join("x.com")).unwrap();

        run_comfile(&comfile, "avg_or", dir.path(), Executor::Local).unwrap();

        let logs = crate::find_files(dir.path(), "avg_or.o*").unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(std::fs::read_to_string(&logs[0]).unwrap(), "-i hello\n");
        assert_eq!(crate::find_files(dir.path(), "avg_or.e*").unwrap().len(), 1);
    }

    #[test]
    fn test_local_run_reports_failure() {
        let dir = tempdir().unwrap();
        let comfile = Comfile::new("false").write(dir.path().join("x.com")).unwrap();

        let err = run_comfile(&comfile, "broken", dir.path(), Executor::Local).unwrap_err();
        assert!(matches!(err, PbmError::ToolFailed { job, .. } if job == "broken"));
    }

    #[test]
    fn test_capture_comfile_returns_stdout() {
        let dir = tempdir().unwrap();
        let comfile = Comfile::new("echo").arg("-g", "a.gpr").write(dir.path().join("make.com")).unwrap();

        assert_eq!(capture_comfile(&comfile, dir.path()).unwrap(), b"-g a.gpr\n");
    }

    #[test]
    fn test_collect_new_artifacts_moves_only_new_entries() {
        let dir = tempdir().unwrap();
        let workdir = dir.path();
        std::fs::write(workdir.join("scan_1-8.gpr"), "raw").unwrap();
        let outdir = crate::create_stage_dir(workdir.join("masliner")).unwrap();

        let moved = collect_new_artifacts(&DirectoryDiff, workdir, &outdir, || {
            std::fs::write(workdir.join("madj001_1-8.gpr"), "adjusted")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(moved, vec![outdir.join("madj001_1-8.gpr")]);
        assert!(workdir.join("scan_1-8.gpr").exists());
        assert!(!workdir.join("madj001_1-8.gpr").exists());
    }

    #[test]
    fn test_collect_new_artifacts_propagates_run_error() {
        let dir = tempdir().unwrap();
        let outdir = crate::create_stage_dir(dir.path().join("out")).unwrap();

        let result = collect_new_artifacts(&DirectoryDiff, dir.path(), &outdir, || {
            Err(PbmError::InvalidInput("tool crashed".to_string()))
        });

        assert!(result.is_err());
    }
}

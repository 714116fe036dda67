use log::{info, warn};
use std::path::{Path, PathBuf};

use config::{
    file_name, find_files, prevent_overwrite, run_comfile, write_collection,
    Comfile, MatrixTag, PbmError,
};

use crate::cli::Args;

/// Builds one data matrix per tag from the files of every averaging directory
///
/// # Arguments
///
/// * `args` - averaging directories, output directory, prefix and executor
///
/// # Returns
///
/// * `Result<Vec<PathBuf>, PbmError>` - paths of the matrices requested
///   from the tool, one per tag that had input files
///
/// # Example
///
/// ```rust, ignore
/// let args = Args::from(vec![
///     "--avg-dirs".to_string(), "/data/488/average_probes,/data/635/average_probes".to_string(),
///     "--outdir".to_string(), "/data/matrices".to_string(),
///     "--prefix".to_string(), "exp1_".to_string(),
/// ]);
/// let matrices = build_data_matrices(&args).unwrap();
/// ```
pub fn build_data_matrices(args: &Args) -> Result<Vec<PathBuf>, PbmError> {
    let outdir = std::path::absolute(&args.outdir)?;
    std::fs::create_dir_all(&outdir)?;

    let avg_dirs = args
        .avg_dirs
        .iter()
        .map(|dir| dir.canonicalize())
        .collect::<Result<Vec<_>, _>>()?;

    let mut matrices = Vec::new();
    for tag in MatrixTag::ALL {
        let files = collect_tag_files(&avg_dirs, tag)?;
        if files.is_empty() {
            warn!(
                "WARN: no '{}' averaged files match '{}', skipping the {} matrix",
                tag.source(),
                tag.pattern(),
                tag
            );
            continue;
        }

        let list = write_collection(
            outdir.join(tag.list_name()),
            files.iter().map(|file| file.display().to_string()),
        )?;

        let matrix = outdir.join(tag.matrix_name(&args.prefix));
        prevent_overwrite(&matrix)?;

        let comfile = make_data_matrix_comfile(
            &args.tool,
            &list,
            &matrix,
            &outdir.join(tag.comfile_name()),
        )?;
        run_comfile(&comfile, &tag.job_name(), &outdir, args.executor)?;

        info!("INFO: {} matrix built from {} files", tag, files.len());
        matrices.push(matrix);
    }

    Ok(matrices)
}

/// Gathers the averaged files of `tag` across `dirs`
///
/// Files of one directory stay together, naturally sorted, and directories
/// keep the order they were given in.
pub fn collect_tag_files(dirs: &[PathBuf], tag: MatrixTag) -> Result<Vec<PathBuf>, PbmError> {
    let mut files = Vec::new();
    for dir in dirs {
        files.extend(find_files(dir, tag.pattern())?);
    }

    if let Some(orientation) = tag.orientation() {
        files.retain(|file| file_name(file).contains(orientation));
    }

    Ok(files)
}

pub fn make_data_matrix_comfile(
    tool: &str,
    list: &Path,
    matrix: &Path,
    comfile: &Path,
) -> Result<PathBuf, PbmError> {
    Comfile::new(tool)
        .arg("-l", list)
        .arg("-o", matrix)
        .write(comfile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Executor;
    use tempfile::tempdir;

    const AVERAGED: [&str; 5] = [
        "or_norm_madj002_1-8.gpr",
        "o1o2top_br_norm_madj002_1-8.gpr",
        "o1match_r_norm_madj002_1-8.gpr",
        "o2match_r_norm_madj002_1-8.gpr",
        "norm_gpr.list",
    ];

    fn avg_dir(root: &Path, name: &str, files: &[&str]) -> PathBuf {
        let dir = root.join(name).join("average_probes");
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), "").unwrap();
        }

        dir.canonicalize().unwrap()
    }

    fn args(avg_dirs: Vec<PathBuf>, outdir: PathBuf, tool: &str) -> Args {
        Args {
            avg_dirs,
            outdir,
            prefix: "exp1_".to_string(),
            executor: Executor::Local,
            tool: tool.to_string(),
        }
    }

    #[test]
    fn test_orientation_split() {
        let root = tempdir().unwrap();
        let dir = avg_dir(root.path(), "488", &AVERAGED);

        let o1 = collect_tag_files(&[dir.clone()], MatrixTag::O1).unwrap();
        let o2 = collect_tag_files(&[dir.clone()], MatrixTag::O2).unwrap();
        assert_eq!(o1, vec![dir.join("o1match_r_norm_madj002_1-8.gpr")]);
        assert_eq!(o2, vec![dir.join("o2match_r_norm_madj002_1-8.gpr")]);

        let or = collect_tag_files(&[dir.clone()], MatrixTag::Or).unwrap();
        assert_eq!(or, vec![dir.join("or_norm_madj002_1-8.gpr")]);
    }

    #[test]
    fn test_files_stay_grouped_by_directory() {
        let root = tempdir().unwrap();
        let files = ["or_norm_madj002_2-8.gpr", "or_norm_madj002_1-8.gpr"];
        let first = avg_dir(root.path(), "635", &files);
        let second = avg_dir(root.path(), "488", &files);

        let or = collect_tag_files(&[first.clone(), second.clone()], MatrixTag::Or).unwrap();
        assert_eq!(
            or,
            vec![
                first.join("or_norm_madj002_1-8.gpr"),
                first.join("or_norm_madj002_2-8.gpr"),
                second.join("or_norm_madj002_1-8.gpr"),
                second.join("or_norm_madj002_2-8.gpr"),
            ]
        );
    }

    #[test]
    fn test_builds_matrices_across_directories() {
        let root = tempdir().unwrap();
        let first = avg_dir(root.path(), "488", &AVERAGED);
        let second = avg_dir(root.path(), "635", &AVERAGED);
        let outdir = root.path().join("matrices");

        let matrices =
            build_data_matrices(&args(vec![first.clone(), second.clone()], outdir.clone(), "echo"))
                .unwrap();

        let names: Vec<String> = matrices.iter().map(file_name).collect();
        assert_eq!(
            names,
            vec![
                "exp1_or_data_matrix.txt",
                "exp1_br_data_matrix.txt",
                "exp1_o1_data_matrix.txt",
                "exp1_o2_data_matrix.txt",
            ]
        );

        let list = std::fs::read_to_string(outdir.join("or_gpr.list")).unwrap();
        assert_eq!(
            list,
            format!(
                "{}\n{}\n",
                first.join("or_norm_madj002_1-8.gpr").display(),
                second.join("or_norm_madj002_1-8.gpr").display()
            )
        );

        let comfile = std::fs::read_to_string(outdir.join("data_matrix_o2.com")).unwrap();
        assert_eq!(
            comfile,
            format!(
                "echo\n-l {}\n-o {}\n",
                outdir.join("o2_gpr.list").display(),
                outdir.join("exp1_o2_data_matrix.txt").display()
            )
        );
    }

    #[test]
    fn test_tag_without_files_is_skipped() {
        let root = tempdir().unwrap();
        let dir = avg_dir(root.path(), "488", &["or_norm_madj002_1-8.gpr"]);
        let outdir = root.path().join("matrices");

        let matrices = build_data_matrices(&args(vec![dir], outdir.clone(), "echo")).unwrap();
        assert_eq!(matrices, vec![outdir.join("exp1_or_data_matrix.txt")]);
        assert!(!outdir.join("br_gpr.list").exists());
        assert!(!outdir.join("data_matrix_o1.com").exists());
    }

    #[test]
    fn test_existing_list_blocks_the_stage() {
        let root = tempdir().unwrap();
        let dir = avg_dir(root.path(), "488", &AVERAGED);
        let outdir = root.path().join("matrices");
        std::fs::create_dir(&outdir).unwrap();
        std::fs::write(outdir.join("or_gpr.list"), "").unwrap();

        assert!(matches!(
            build_data_matrices(&args(vec![dir], outdir, "echo")),
            Err(PbmError::AlreadyExists(_))
        ));
    }
}

//! Shared configuration for the pbmtools pipeline
//!
//! This crate holds everything the individual pipeline tools agree on:
//! the naming conventions used to discover files, the paths of the external
//! PBM tools each stage wraps, the fixed names of generated artifacts and
//! the plumbing used to write command scripts, submit them to the cluster
//! and collect whatever the external tool left behind.
//!
//! The naming conventions below are shared with the external Perl tools and
//! must be kept bit-exact.

use serde::Serialize;

pub mod error;
pub mod exec;
pub mod fns;
pub mod mods;

pub use error::*;
pub use exec::*;
pub use fns::*;
pub use mods::*;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// file patterns
pub const ANALYSIS_PATTERN: &str = "*analysis*.txt";
pub const DESIGN_PATTERN: &str = "*DNAFront_BCBottom*.tdt";
pub const SEQUENCE_PATTERN: &str = "*SequenceList*.txt";
pub const GPR_PATTERN: &str = "*.gpr";
pub const MADJ_PATTERN: &str = "madj*.gpr";
pub const NORM_PATTERN: &str = "norm_madj*.gpr";

// naming
pub const DESIGN_MARKER: &str = "_D_DNAFront_BCBottom";
pub const CHAMBER_SUFFIX_LEN: usize = 7; // e.g. 1-8.gpr
pub const SERIES_DELIMITER: char = '_';

// external tools
pub const MAKE_ANALYSIS_TOOL: &str =
    "perl /projectnb/siggers/perl_master/PBM/make_PBM_analysis_file.pl";
pub const MASLINER_TOOL: &str = "perl /project/siggers/perl/GENEPIX/masliner_list.pl";
pub const DETREND_TOOL: &str = "perl /project/siggers/perl/GENEPIX/gpr_file_process_conc_series.pl";
pub const AVERAGE_TOOL: &str =
    "perl /project/siggers/perl/GENEPIX/average_replicate_rc_custom_probes.pl";
pub const MATRIX_TOOL: &str = "perl /project/siggers/perl/GENEPIX/control_sequence_process.pl";

// scheduler
pub const QSUB: &str = "qsub";
pub const QSUB_FLAGS: [&str; 8] = ["-sync", "y", "-m", "a", "-V", "-cwd", "-b", "y"];

// job names
pub const MASLINER_JOB: &str = "masliner";
pub const DETREND_JOB: &str = "customprobes";

// file names
pub const ANALYSIS_COMFILE: &str = "make_analysis_file.com";
pub const DETREND_COMFILE: &str = "spatial_detrend.com";
pub const MADJ_LIST: &str = "madj_gpr.list";
pub const NORM_LIST: &str = "norm_gpr.list";
pub const RUN_DESCRIPTOR: &str = "run_descriptor.json";
pub const LOG_FILE: &str = "preprocess.log";

// stage directories
pub const MASLINER_DIR: &str = "masliner";
pub const DETREND_DIR: &str = "spatial_detrend";
pub const AVERAGE_DIR: &str = "average_probes";

// experiment description
pub const DESCRIPTION_HEADER: [&str; 3] = ["Pbm=1", "Concentration=100", "Cy3=FOO"];

// channels
pub const REFERENCE_CHANNEL: &str = "635";
pub const ALTERNATE_CHANNEL: &str = "647";

// quality
pub const QUALITY_TOKEN: &str = "R-squared";

/// averaging strategies understood by the probe averaging tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AvgType {
    Or, // across orientations
    Br, // best replicate pair
    R,  // per orientation
}

impl AvgType {
    pub const ALL: [AvgType; 3] = [AvgType::Or, AvgType::Br, AvgType::R];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvgType::Or => "or",
            AvgType::Br => "br",
            AvgType::R => "r",
        }
    }

    pub fn job_name(&self) -> String {
        format!("avg_{}", self.as_str())
    }

    pub fn comfile_name(&self) -> String {
        format!("average_probes_{}.com", self.as_str())
    }
}

impl std::fmt::Display for AvgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// data matrix variants; the per-orientation average is split in two
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatrixTag {
    Or,
    Br,
    O1,
    O2,
}

impl MatrixTag {
    pub const ALL: [MatrixTag; 4] = [MatrixTag::Or, MatrixTag::Br, MatrixTag::O1, MatrixTag::O2];

    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixTag::Or => "or",
            MatrixTag::Br => "br",
            MatrixTag::O1 => "o1",
            MatrixTag::O2 => "o2",
        }
    }

    /// glob used to find the averaged files of this variant
    pub fn pattern(&self) -> &'static str {
        match self {
            MatrixTag::Or => "or_norm_madj*.gpr",
            MatrixTag::Br => "o1o2top_br_norm_madj*.gpr",
            MatrixTag::O1 | MatrixTag::O2 => "o[12]match_r_norm_madj*.gpr",
        }
    }

    /// substring a file name must carry to belong to this variant
    pub fn orientation(&self) -> Option<&'static str> {
        match self {
            MatrixTag::O1 => Some("o1match"),
            MatrixTag::O2 => Some("o2match"),
            _ => None,
        }
    }

    pub fn source(&self) -> AvgType {
        match self {
            MatrixTag::Or => AvgType::Or,
            MatrixTag::Br => AvgType::Br,
            MatrixTag::O1 | MatrixTag::O2 => AvgType::R,
        }
    }

    pub fn list_name(&self) -> String {
        format!("{}_gpr.list", self.as_str())
    }

    pub fn comfile_name(&self) -> String {
        format!("data_matrix_{}.com", self.as_str())
    }

    pub fn job_name(&self) -> String {
        format!("{}matrix", self.as_str())
    }

    pub fn matrix_name(&self, prefix: &str) -> String {
        format!("{}{}_data_matrix.txt", prefix, self.as_str())
    }
}

impl std::fmt::Display for MatrixTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

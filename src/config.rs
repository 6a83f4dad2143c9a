//! Run configuration

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

/// Only files whose name contains this marker are processed
pub const DEFAULT_NAME_MARKER: &str = "RD";
/// Extension of eligible input files
pub const INPUT_EXTENSION: &str = "xml";
const WORKSPACE_PREFIX: &str = "openmedia-minify-tmp";

/// How the (year, week) naming both archives is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeekPolicy {
    /// The week shared by most passed files; ties go to the latest week
    #[default]
    MostCommon,
    /// All passed files must share one week, otherwise the run fails
    Uniform,
}

impl FromStr for WeekPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most-common" => Ok(WeekPolicy::MostCommon),
            "uniform" => Ok(WeekPolicy::Uniform),
            other => Err(format!("unknown week policy '{}' (expected most-common or uniform)", other)),
        }
    }
}

impl fmt::Display for WeekPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeekPolicy::MostCommon => f.write_str("most-common"),
            WeekPolicy::Uniform => f.write_str("uniform"),
        }
    }
}

/// What to do with a file that has no date field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingDatePolicy {
    /// Fail the file
    #[default]
    Fail,
    /// Name the file from the zero date key
    Degrade,
}

/// Configuration for one minify run
#[derive(Debug, Clone)]
pub struct MinifyConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Parent directory of the scratch workspace
    pub workspace_root: PathBuf,
    pub name_marker: String,
    pub week_policy: WeekPolicy,
    pub missing_date: MissingDatePolicy,
    /// Number of files processed concurrently (at least 1)
    pub jobs: usize,
}

impl MinifyConfig {
    /// Create a config for `input_dir` -> `output_dir` with default settings
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            workspace_root: std::env::temp_dir(),
            name_marker: DEFAULT_NAME_MARKER.to_string(),
            week_policy: WeekPolicy::default(),
            missing_date: MissingDatePolicy::default(),
            jobs: 1,
        }
    }

    /// Set the directory the scratch workspace is created in
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Set the substring eligible file names must contain
    pub fn with_name_marker(mut self, marker: impl Into<String>) -> Self {
        self.name_marker = marker.into();
        self
    }

    /// Set how the archive week is chosen
    pub fn with_week_policy(mut self, policy: WeekPolicy) -> Self {
        self.week_policy = policy;
        self
    }

    /// Set what happens to files without a date field
    pub fn with_missing_date(mut self, policy: MissingDatePolicy) -> Self {
        self.missing_date = policy;
        self
    }

    /// Set the number of worker threads; values below 1 mean 1
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Scratch workspace for a run started on `date` by process `pid`
    pub fn workspace_dir(&self, date: NaiveDate, pid: u32) -> PathBuf {
        workspace_dir_in(&self.workspace_root, date, pid)
    }

    /// Whether a directory entry should be processed
    pub fn is_eligible(&self, name: &str, is_dir: bool) -> bool {
        !is_dir
            && Path::new(name).extension().and_then(|e| e.to_str()) == Some(INPUT_EXTENSION)
            && name.contains(&self.name_marker)
    }
}

fn workspace_dir_in(root: &Path, date: NaiveDate, pid: u32) -> PathBuf {
    root.join(format!("{}_{}_{}", WORKSPACE_PREFIX, date.format("%Y%m%d"), pid))
}

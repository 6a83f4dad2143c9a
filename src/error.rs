//! Error taxonomy

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::archive::ArchiveError;
use crate::date_key::DateKeyError;
use crate::decoder::DecodeError;
use crate::validate::ValidationError;

/// Which side of the transformation failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    /// The untouched input file
    Source,
    /// The minified file written to the workspace
    Output,
}

impl fmt::Display for ValidationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStage::Source => f.write_str("source"),
            ValidationStage::Output => f.write_str("output"),
        }
    }
}

/// Errors raised while minifying a batch.
///
/// Per-file variants are recorded against the file and counted as failures;
/// the remaining variants abort the run.
#[derive(Debug, Error)]
pub enum MinifyError {
    #[error("failed to list input directory {path}: {source}")]
    ListInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to prepare workspace {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    #[error("no date field found in {path}")]
    MissingDate { path: PathBuf },

    #[error("bad date field in {path}: {source}")]
    DateKey {
        path: PathBuf,
        #[source]
        source: DateKeyError,
    },

    #[error("cannot derive output name from {name}: expected at least two '-' separated segments")]
    FileName { name: String },

    #[error("output name {name} is already taken by {claimed_by}")]
    DuplicateOutput { name: String, claimed_by: String },

    #[error("{stage} file is not valid XML: {path}: {source}")]
    Validation {
        stage: ValidationStage,
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("failed to save file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("passed files span several ISO weeks: {weeks}")]
    MixedWeeks { weeks: String },

    #[error("failed to create zip archive {name}: {source}")]
    Archive {
        name: String,
        #[source]
        source: ArchiveError,
    },
}

impl MinifyError {
    /// Whether this error only affects a single input file
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            MinifyError::Read { .. }
                | MinifyError::Decode { .. }
                | MinifyError::MissingDate { .. }
                | MinifyError::DateKey { .. }
                | MinifyError::FileName { .. }
                | MinifyError::DuplicateOutput { .. }
                | MinifyError::Validation { .. }
                | MinifyError::Write { .. }
        )
    }

    /// Short name of the pipeline step that failed, used in log lines
    pub fn stage(&self) -> &'static str {
        match self {
            MinifyError::ListInput { .. } => "list",
            MinifyError::Workspace { .. } => "workspace",
            MinifyError::Read { .. } => "read",
            MinifyError::Decode { .. } => "decode",
            MinifyError::MissingDate { .. } | MinifyError::DateKey { .. } => "date",
            MinifyError::FileName { .. } | MinifyError::DuplicateOutput { .. } => "rename",
            MinifyError::Validation { stage: ValidationStage::Source, .. } => "pre-validate",
            MinifyError::Validation { stage: ValidationStage::Output, .. } => "post-validate",
            MinifyError::Write { .. } => "write",
            MinifyError::MixedWeeks { .. } => "week",
            MinifyError::Archive { .. } => "archive",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ValidationIssue;

    #[test]
    fn test_per_file_classification() {
        let err = MinifyError::FileName { name: "RD.xml".into() };
        assert!(err.is_per_file());
        assert_eq!(err.stage(), "rename");

        let err = MinifyError::DuplicateOutput {
            name: "RD-A_Friday_W11_2024_03_15.xml".into(),
            claimed_by: "RD-A-1.xml".into(),
        };
        assert!(err.is_per_file());
        assert_eq!(err.stage(), "rename");
        assert_eq!(
            err.to_string(),
            "output name RD-A_Friday_W11_2024_03_15.xml is already taken by RD-A-1.xml"
        );

        let err = MinifyError::MixedWeeks { weeks: "2024_W10, 2024_W11".into() };
        assert!(!err.is_per_file());
    }

    #[test]
    fn test_validation_message_includes_first_issue() {
        let err = MinifyError::Validation {
            stage: ValidationStage::Output,
            path: PathBuf::from("/tmp/out.xml"),
            source: ValidationError::single(7, "premature end of data"),
        };
        let message = err.to_string();
        assert!(message.starts_with("output file is not valid XML"));
        assert!(message.contains("line 7: premature end of data"));
        assert_eq!(err.stage(), "post-validate");

        let issue = ValidationIssue { line: 7, message: "premature end of data".into() };
        assert_eq!(issue.to_string(), "line 7: premature end of data");
    }
}

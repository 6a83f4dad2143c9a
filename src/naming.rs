//! Output and archive file names

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::date_key::{DateKey, WeekKey};

/// Suffix given to outputs that failed post-validation
pub const MALFORMED_SUFFIX: &str = "_MALFORMED";
const XML_EXTENSION: &str = "xml";

/// Derive the canonical output name for an export.
///
/// `RD-2024-xyz.xml` with a key for Friday 2024-03-15 becomes
/// `RD-2024_Friday_W11_2024_03_15.xml`. Returns `None` when the name has
/// fewer than two `-` separated segments.
pub fn derive_output_name(original: &str, key: &DateKey) -> Option<String> {
    let mut segments = original.split('-');
    let first = segments.next()?;
    let second = segments.next()?;

    let mut prefix = format!("{}-{}", first, second);
    if !prefix.ends_with('_') {
        prefix.push('_');
    }

    Some(format!(
        "{}{}_W{:02}_{:04}_{:02}_{:02}.{}",
        prefix, key.weekday, key.iso_week, key.iso_year, key.month, key.day, XML_EXTENSION
    ))
}

/// Path a malformed output is moved to: `X.xml` -> `X_MALFORMED.xml`
pub fn malformed_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}.{}", stem, MALFORMED_SUFFIX, XML_EXTENSION))
}

/// Rename an output that failed validation so it is never delivered under
/// its canonical name. Returns the new path.
pub fn mark_corrupt(path: &Path) -> io::Result<PathBuf> {
    let target = malformed_path(path);
    fs::rename(path, &target)?;
    Ok(target)
}

/// The two archives produced per run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Minified,
    Original,
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveKind::Minified => f.write_str("MINIFIED"),
            ArchiveKind::Original => f.write_str("ORIGINAL"),
        }
    }
}

/// Archive name for a batch, e.g. `2024_W11_MINIFIED.zip`
pub fn archive_name(week: WeekKey, kind: ArchiveKind) -> String {
    format!("{}_{}.zip", week, kind)
}

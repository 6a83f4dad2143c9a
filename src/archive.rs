//! Directory archiving

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Component, Path};

use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Separator used for entry names inside an archive
pub const ENTRY_SEPARATOR: &str = "/";

/// Errors raised while writing an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("source {0} is not a directory")]
    NotADirectory(std::path::PathBuf),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// What went into an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub files: usize,
    pub directories: usize,
}

/// Packages a directory tree into an archive file
pub trait Archiver: Send + Sync {
    fn archive_dir(&self, source: &Path, target: &Path) -> Result<ArchiveSummary, ArchiveError>;
}

impl<T: Archiver + ?Sized> Archiver for &T {
    fn archive_dir(&self, source: &Path, target: &Path) -> Result<ArchiveSummary, ArchiveError> {
        (**self).archive_dir(source, target)
    }
}

impl<T: Archiver + ?Sized> Archiver for Box<T> {
    fn archive_dir(&self, source: &Path, target: &Path) -> Result<ArchiveSummary, ArchiveError> {
        (**self).archive_dir(source, target)
    }
}

/// Writes zip archives.
///
/// Entry names are relative to the source directory (no base directory),
/// directories are stored with a trailing `/` and files are deflated.
/// Entries are added in file-name order.
#[derive(Debug, Clone)]
pub struct ZipArchiver {
    compression: CompressionMethod,
}

impl ZipArchiver {
    /// Create an archiver that deflates file entries
    pub fn new() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }

    fn write(&self, source: &Path, target: &Path) -> Result<ArchiveSummary, ArchiveError> {
        let file = fs::File::create(target)?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let dir_options = SimpleFileOptions::default();
        let file_options = SimpleFileOptions::default().compression_method(self.compression);
        let target_abs = fs::canonicalize(target)?;
        let mut summary = ArchiveSummary::default();

        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            let name = entry_name(path.strip_prefix(source).unwrap_or(path));

            if entry.file_type().is_dir() {
                zip.add_directory(format!("{}{}", name, ENTRY_SEPARATOR), dir_options)?;
                summary.directories += 1;
            } else if entry.file_type().is_file() {
                if fs::canonicalize(path).map(|p| p == target_abs).unwrap_or(false) {
                    continue;
                }
                zip.start_file(name, file_options)?;
                let mut input = fs::File::open(path)?;
                io::copy(&mut input, &mut zip)?;
                summary.files += 1;
            }
        }

        zip.finish()?;
        Ok(summary)
    }
}

impl Default for ZipArchiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for ZipArchiver {
    fn archive_dir(&self, source: &Path, target: &Path) -> Result<ArchiveSummary, ArchiveError> {
        if !source.is_dir() {
            return Err(ArchiveError::NotADirectory(source.to_path_buf()));
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let result = self.write(source, target);
        if result.is_err() {
            // Never leave a truncated archive behind.
            let _ = fs::remove_file(target);
        }
        result
    }
}

/// Archive entry name for a path relative to the archive root
fn entry_name(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    parts.join(ENTRY_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn entries(archive: &Path) -> Vec<String> {
        let file = fs::File::open(archive).unwrap();
        let mut zip = zip::ZipArchive::new(file).unwrap();
        (0..zip.len()).map(|i| zip.by_index(i).unwrap().name().to_string()).collect()
    }

    #[test]
    fn test_archive_flat_directory() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("b.xml"), "<b/>").unwrap();
        fs::write(src.path().join("a.xml"), "<a/>").unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("2024_W11_MINIFIED.zip");

        let summary = ZipArchiver::new().archive_dir(src.path(), &target).unwrap();

        assert_eq!(summary, ArchiveSummary { files: 2, directories: 0 });
        assert_eq!(entries(&target), vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_archive_nested_directories() {
        let src = tempfile::tempdir().unwrap();
        fs::create_dir_all(src.path().join("sub/deeper")).unwrap();
        fs::write(src.path().join("sub/deeper/c.xml"), "<c/>").unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("nested.zip");

        let summary = ZipArchiver::new().archive_dir(src.path(), &target).unwrap();

        assert_eq!(summary, ArchiveSummary { files: 1, directories: 2 });
        assert_eq!(entries(&target), vec!["sub/", "sub/deeper/", "sub/deeper/c.xml"]);
    }

    #[test]
    fn test_file_content_round_trips() {
        let src = tempfile::tempdir().unwrap();
        let body = "<OPENMEDIA>\n".repeat(200);
        fs::write(src.path().join("doc.xml"), &body).unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("doc.zip");

        ZipArchiver::new().archive_dir(src.path(), &target).unwrap();

        let mut zip = zip::ZipArchive::new(fs::File::open(&target).unwrap()).unwrap();
        let mut entry = zip.by_name("doc.xml").unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, body);
    }

    #[test]
    fn test_target_inside_source_is_skipped() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("a.xml"), "<a/>").unwrap();
        let target = src.path().join("self.zip");

        let summary = ZipArchiver::new().archive_dir(src.path(), &target).unwrap();

        assert_eq!(summary.files, 1);
        assert_eq!(entries(&target), vec!["a.xml"]);
    }

    #[test]
    fn test_output_directory_is_created() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("missing/dir/empty.zip");

        let summary = ZipArchiver::new().archive_dir(src.path(), &target).unwrap();

        assert_eq!(summary, ArchiveSummary::default());
        assert!(target.exists());
    }

    #[test]
    fn test_missing_source_fails_without_leaving_archive() {
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("x.zip");

        let err = ZipArchiver::new()
            .archive_dir(&out.path().join("does-not-exist"), &target)
            .unwrap_err();

        assert!(matches!(err, ArchiveError::NotADirectory(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        assert_eq!(entry_name(Path::new("a").join("b").join("c.xml").as_path()), "a/b/c.xml");
    }
}

//! Batch orchestration
//!
//! A run moves through these states:
//!
//! ```text
//! Idle -> WorkspacePrepared -> ProcessingFiles -> ArchivingMinified
//!      -> ArchivingOriginal -> CleaningUp -> Done
//! ```
//!
//! Per-file failures are counted and never stop the batch. Failing to
//! prepare the workspace, list the input directory, pick the batch week or
//! write either archive ends the run. The workspace is removed on every path
//! out of a run.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::archive::{Archiver, ZipArchiver};
use crate::config::{MinifyConfig, MissingDatePolicy, WeekPolicy};
use crate::date_key::{DateKey, DateKeyScanner, WeekKey};
use crate::decoder::Utf16Lines;
use crate::encoder::Encoder;
use crate::error::{MinifyError, ValidationStage};
use crate::filter::{FilteredDocument, LineFilter};
use crate::naming::{archive_name, derive_output_name, mark_corrupt, ArchiveKind};
use crate::validate::{SchemaValidator, WellFormedValidator};

/// Placeholder output name for files that did not pass
pub const NOT_APPLICABLE: &str = "n/a";

/// Run states, used for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    WorkspacePrepared,
    ProcessingFiles,
    ArchivingMinified,
    ArchivingOriginal,
    CleaningUp,
    Done,
    Failed,
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BatchState::Idle => "idle",
            BatchState::WorkspacePrepared => "workspace prepared",
            BatchState::ProcessingFiles => "processing files",
            BatchState::ArchivingMinified => "archiving minified",
            BatchState::ArchivingOriginal => "archiving original",
            BatchState::CleaningUp => "cleaning up",
            BatchState::Done => "done",
            BatchState::Failed => "failed",
        };
        f.write_str(name)
    }
}

fn enter(state: BatchState) {
    debug!("batch state: {}", state);
}

/// One entry of the input directory
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
}

/// List a directory, sorted by file name
pub fn list_entries(dir: &Path) -> Result<Vec<SourceEntry>, MinifyError> {
    let list_error = |source| MinifyError::ListInput {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        let file_type = entry.file_type().map_err(list_error)?;
        entries.push(SourceEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Scratch directory owning the minified outputs of one run.
///
/// Removed by [`Workspace::close`] or, failing that, on drop.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    removed: bool,
}

impl Workspace {
    /// Create a fresh workspace at `path`, removing a stale one first
    pub fn prepare(path: PathBuf) -> Result<Self, MinifyError> {
        if path.exists() {
            debug!("removing stale workspace {}", path.display());
            if let Err(source) = fs::remove_dir_all(&path) {
                return Err(MinifyError::Workspace { path, source });
            }
        }
        if let Err(source) = fs::create_dir_all(&path) {
            return Err(MinifyError::Workspace { path, source });
        }
        Ok(Self { path, removed: false })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace and everything in it
    pub fn close(mut self) -> io::Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> io::Result<()> {
        if self.removed {
            return Ok(());
        }
        self.removed = true;
        match fs::remove_dir_all(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!("failed to remove workspace {}: {}", self.path.display(), e);
        }
    }
}

/// A file that made it through the whole pipeline
#[derive(Debug, Clone)]
pub struct MinifiedFile {
    pub output_name: String,
    pub date_key: DateKey,
    pub kept_lines: usize,
    pub dropped_lines: usize,
}

/// A decoded, filtered and source-validated export waiting to be written
#[derive(Debug)]
struct PreparedFile {
    output_name: String,
    date_key: DateKey,
    doc: FilteredDocument,
}

/// Result of processing one eligible input file
#[derive(Debug)]
pub struct ProcessingOutcome {
    /// 1-based position among eligible files
    pub index: usize,
    pub source_name: String,
    pub result: Result<MinifiedFile, MinifyError>,
}

impl ProcessingOutcome {
    /// The written file name, or [`NOT_APPLICABLE`] for a failed file
    pub fn output_name(&self) -> &str {
        match &self.result {
            Ok(file) => &file.output_name,
            Err(_) => NOT_APPLICABLE,
        }
    }

    pub fn week(&self) -> Option<WeekKey> {
        self.result.as_ref().ok().map(|file| file.date_key.week_key())
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Eligible files seen
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Directory entries that were not eligible
    pub skipped: usize,
    pub passed_files: Vec<String>,
    pub failed_files: Vec<String>,
    /// Pipeline step each failed file stopped at, parallel to `failed_files`
    pub failed_stages: Vec<&'static str>,
    /// Weeks of passed files, zero keys excluded
    pub weeks: Vec<WeekKey>,
}

impl BatchResult {
    /// Count one processed file
    pub fn record(&mut self, outcome: &ProcessingOutcome) {
        self.total += 1;
        match &outcome.result {
            Ok(file) => {
                self.passed += 1;
                self.passed_files.push(outcome.output_name().to_string());
                if !file.date_key.is_zero() {
                    self.weeks.extend(outcome.week());
                }
            }
            Err(e) => {
                self.failed += 1;
                self.failed_files.push(outcome.source_name.clone());
                self.failed_stages.push(e.stage());
            }
        }
    }

    /// The (year, week) used to name both archives
    pub fn representative_week(&self, policy: WeekPolicy) -> Result<WeekKey, MinifyError> {
        let mut counts: BTreeMap<WeekKey, usize> = BTreeMap::new();
        for week in &self.weeks {
            *counts.entry(*week).or_default() += 1;
        }

        if counts.len() > 1 && policy == WeekPolicy::Uniform {
            let weeks = counts.keys().map(ToString::to_string).collect::<Vec<_>>().join(", ");
            return Err(MinifyError::MixedWeeks { weeks });
        }

        Ok(counts
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(week, _)| week)
            .unwrap_or_default())
    }
}

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub result: BatchResult,
    pub week: WeekKey,
    pub minified_archive: PathBuf,
    pub original_archive: PathBuf,
}

/// Minifies a directory of exports and archives the results
pub struct Minifier<V = WellFormedValidator, A = ZipArchiver> {
    config: MinifyConfig,
    validator: V,
    archiver: A,
    encoder: Encoder,
}

impl Minifier {
    /// Minifier with the default validator and zip archiver
    pub fn new(config: MinifyConfig) -> Self {
        Self {
            config,
            validator: WellFormedValidator::new(),
            archiver: ZipArchiver::new(),
            encoder: Encoder::new(),
        }
    }
}

impl<V: SchemaValidator, A: Archiver> Minifier<V, A> {
    /// Replace the validator used for source and output documents
    pub fn with_validator<W: SchemaValidator>(self, validator: W) -> Minifier<W, A> {
        Minifier {
            config: self.config,
            validator,
            archiver: self.archiver,
            encoder: self.encoder,
        }
    }

    /// Replace the archiver used for both archives
    pub fn with_archiver<B: Archiver>(self, archiver: B) -> Minifier<V, B> {
        Minifier {
            config: self.config,
            validator: self.validator,
            archiver,
            encoder: self.encoder,
        }
    }

    /// Run the batch in the workspace for today and this process
    pub fn run(&self) -> Result<BatchReport, MinifyError> {
        let workspace = self
            .config
            .workspace_dir(Local::now().date_naive(), std::process::id());
        self.run_in(workspace)
    }

    /// Run the batch using `workspace_path` as the scratch workspace
    pub fn run_in(&self, workspace_path: PathBuf) -> Result<BatchReport, MinifyError> {
        enter(BatchState::Idle);
        let workspace = Workspace::prepare(workspace_path)?;
        enter(BatchState::WorkspacePrepared);

        let result = self.run_batch(&workspace);

        enter(BatchState::CleaningUp);
        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("failed to remove workspace {}: {}", path.display(), e);
        }

        match &result {
            Ok(_) => enter(BatchState::Done),
            Err(_) => enter(BatchState::Failed),
        }
        result
    }

    fn run_batch(&self, workspace: &Workspace) -> Result<BatchReport, MinifyError> {
        let entries = list_entries(&self.config.input_dir)?;
        let (eligible, skipped): (Vec<SourceEntry>, Vec<SourceEntry>) = entries
            .into_iter()
            .partition(|e| self.config.is_eligible(&e.name, e.is_dir));
        for entry in &skipped {
            debug!(
                "skipping {}: folder, non-XML or non-{} file",
                entry.name, self.config.name_marker
            );
        }

        enter(BatchState::ProcessingFiles);
        let outcomes = self.process_all(&eligible, workspace.path());

        let mut result = BatchResult {
            skipped: skipped.len(),
            ..BatchResult::default()
        };
        for outcome in &outcomes {
            result.record(outcome);
        }

        info!(
            "files processed, PASS/FAIL/TOTAL: {}/{}/{}",
            result.passed, result.failed, result.total
        );

        let week = result.representative_week(self.config.week_policy)?;
        if result.weeks.is_empty() {
            warn!("no dated file passed, archives are named {}", week);
        }

        enter(BatchState::ArchivingMinified);
        info!("zipping minified, no. of files: {}", result.passed);
        let minified_archive = self.archive(ArchiveKind::Minified, workspace.path(), week)?;

        enter(BatchState::ArchivingOriginal);
        info!("zipping originals, no. of files: {}", result.total);
        let original_archive = self.archive(ArchiveKind::Original, &self.config.input_dir, week)?;

        info!("minifier finished, archives written to {}", self.config.output_dir.display());

        Ok(BatchReport {
            result,
            week,
            minified_archive,
            original_archive,
        })
    }

    fn archive(&self, kind: ArchiveKind, source: &Path, week: WeekKey) -> Result<PathBuf, MinifyError> {
        let name = archive_name(week, kind);
        let target = self.config.output_dir.join(&name);
        info!("zipping {} to archive {}", source.display(), target.display());

        match self.archiver.archive_dir(source, &target) {
            Ok(summary) => {
                debug!(
                    "{}: {} files, {} directories",
                    name, summary.files, summary.directories
                );
                Ok(target)
            }
            Err(source) => {
                error!("zipping {} FAILED: {}", name, source);
                Err(MinifyError::Archive { name, source })
            }
        }
    }

    /// Run `f` for every index in `0..count`, on the worker pool when more
    /// than one job is configured. Results come back in index order.
    fn run_indexed<T, F>(&self, count: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync,
    {
        let jobs = self.config.jobs.clamp(1, count.max(1));
        if jobs == 1 {
            return (0..count).map(&f).collect();
        }

        let next = AtomicUsize::new(0);
        let work = || {
            let mut done = Vec::new();
            loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= count {
                    break;
                }
                done.push((i, f(i)));
            }
            done
        };
        let mut results: Vec<(usize, T)> = thread::scope(|scope| {
            let workers: Vec<_> = (0..jobs).map(|_| scope.spawn(&work)).collect();
            workers
                .into_iter()
                .flat_map(|worker| worker.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });
        results.sort_by_key(|(i, _)| *i);
        results.into_iter().map(|(_, result)| result).collect()
    }

    /// Minify every eligible entry.
    ///
    /// Files are prepared (decoded, filtered, dated, named and source
    /// validated) independently, then output names are claimed in input
    /// order, then the claimed outputs are written and checked. Which file
    /// loses a name collision therefore never depends on scheduling.
    fn process_all(&self, entries: &[SourceEntry], workspace: &Path) -> Vec<ProcessingOutcome> {
        let total = entries.len();
        if self.config.jobs > 1 && total > 1 {
            debug!("processing {} files with up to {} workers", total, self.config.jobs);
        }

        let mut prepared = self.run_indexed(total, |i| self.prepare_file(&entries[i]));
        claim_output_names(entries, &mut prepared);

        let mut results: Vec<(usize, Result<MinifiedFile, MinifyError>)> = Vec::with_capacity(total);
        let mut ready = Vec::new();
        for (i, file) in prepared.into_iter().enumerate() {
            match file {
                Ok(file) => ready.push((i, file)),
                Err(e) => results.push((i, Err(e))),
            }
        }
        results.extend(self.run_indexed(ready.len(), |k| {
            let (i, file) = &ready[k];
            (*i, self.write_file(file, workspace))
        }));
        results.sort_by_key(|(i, _)| *i);

        results
            .into_iter()
            .map(|(i, result)| {
                let entry = &entries[i];
                match &result {
                    Ok(file) => info!(
                        "minifying PASSED! {}/{} -> {} ({} lines kept, {} dropped)",
                        i + 1,
                        total,
                        file.output_name,
                        file.kept_lines,
                        file.dropped_lines
                    ),
                    Err(e) => error!(
                        "minifying FAILED! {}/{} {} [{}]: {}",
                        i + 1,
                        total,
                        entry.name,
                        e.stage(),
                        e
                    ),
                }
                ProcessingOutcome {
                    index: i + 1,
                    source_name: entry.name.clone(),
                    result,
                }
            })
            .collect()
    }

    /// Everything up to the point where the output file would be written
    fn prepare_file(&self, entry: &SourceEntry) -> Result<PreparedFile, MinifyError> {
        info!("minifying: {}", entry.path.display());
        let source_path = &entry.path;
        let original = fs::read(source_path).map_err(|source| MinifyError::Read {
            path: source_path.clone(),
            source,
        })?;

        let mut filter = LineFilter::new();
        let mut dates = DateKeyScanner::new();
        for line in Utf16Lines::new(original.as_slice()) {
            let line = line.map_err(|source| MinifyError::Decode {
                path: source_path.clone(),
                source,
            })?;
            dates.observe(&line);
            filter.push(&line);
        }
        let doc = filter.finish();
        info!(
            "document minified from {} lines to {} lines, ratio: {:.2}%",
            doc.total(),
            doc.kept,
            doc.ratio()
        );

        let date_key = match dates.finish() {
            Ok(Some(key)) => key,
            Ok(None) => match self.config.missing_date {
                MissingDatePolicy::Fail => {
                    return Err(MinifyError::MissingDate {
                        path: source_path.clone(),
                    })
                }
                MissingDatePolicy::Degrade => {
                    warn!("no date field in {}, using zero date", source_path.display());
                    DateKey::default()
                }
            },
            Err(source) => {
                return Err(MinifyError::DateKey {
                    path: source_path.clone(),
                    source,
                })
            }
        };

        let output_name = derive_output_name(&entry.name, &date_key).ok_or_else(|| MinifyError::FileName {
            name: entry.name.clone(),
        })?;

        debug!("validating source file: {}", source_path.display());
        self.validator
            .validate(&original)
            .map_err(|source| MinifyError::Validation {
                stage: ValidationStage::Source,
                path: source_path.clone(),
                source,
            })?;

        Ok(PreparedFile {
            output_name,
            date_key,
            doc,
        })
    }

    /// Write a prepared file to the workspace and validate what landed
    fn write_file(&self, file: &PreparedFile, workspace: &Path) -> Result<MinifiedFile, MinifyError> {
        let output_path = workspace.join(&file.output_name);
        self.encoder
            .encode_to_file(&file.doc.lines, &output_path)
            .map_err(|source| MinifyError::Write {
                path: output_path.clone(),
                source,
            })?;

        debug!("validating destination file: {}", output_path.display());
        let written = fs::read(&output_path).map_err(|source| MinifyError::Read {
            path: output_path.clone(),
            source,
        })?;
        if let Err(source) = self.validator.validate(&written) {
            match mark_corrupt(&output_path) {
                Ok(moved) => warn!("marked output as malformed: {}", moved.display()),
                Err(e) => error!("error renaming file {}: {}", output_path.display(), e),
            }
            return Err(MinifyError::Validation {
                stage: ValidationStage::Output,
                path: output_path,
                source,
            });
        }

        Ok(MinifiedFile {
            output_name: file.output_name.clone(),
            date_key: file.date_key.clone(),
            kept_lines: file.doc.kept,
            dropped_lines: file.doc.dropped,
        })
    }
}

/// Fail every prepared file whose output name an earlier file already holds
fn claim_output_names(entries: &[SourceEntry], prepared: &mut [Result<PreparedFile, MinifyError>]) {
    let mut claimed: HashMap<String, usize> = HashMap::new();
    for (i, slot) in prepared.iter_mut().enumerate() {
        let Ok(file) = slot else {
            continue;
        };
        match claimed.entry(file.output_name.clone()) {
            Entry::Occupied(first) => {
                *slot = Err(MinifyError::DuplicateOutput {
                    name: first.key().clone(),
                    claimed_by: entries[*first.get()].name.clone(),
                });
            }
            Entry::Vacant(vacant) => {
                vacant.insert(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn outcome(index: usize, date: Option<(i32, u32, u32)>) -> ProcessingOutcome {
        let result = match date {
            Some((y, m, d)) => Ok(MinifiedFile {
                output_name: format!("RD-{}.xml", index),
                date_key: DateKey::from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap()),
                kept_lines: 1,
                dropped_lines: 0,
            }),
            None => Err(MinifyError::FileName { name: format!("RD{}.xml", index) }),
        };
        ProcessingOutcome {
            index,
            source_name: format!("RD{}.xml", index),
            result,
        }
    }

    fn result_of(outcomes: &[ProcessingOutcome]) -> BatchResult {
        let mut result = BatchResult::default();
        for o in outcomes {
            result.record(o);
        }
        result
    }

    #[test]
    fn test_record_counts() {
        let outcomes = [outcome(1, Some((2024, 3, 15))), outcome(2, None), outcome(3, Some((2024, 3, 16)))];
        let result = result_of(&outcomes);

        assert_eq!((result.total, result.passed, result.failed), (3, 2, 1));
        assert_eq!(result.passed_files, vec!["RD-1.xml", "RD-3.xml"]);
        assert_eq!(result.failed_files, vec!["RD2.xml"]);
        assert_eq!(result.failed_stages, vec!["rename"]);
        assert_eq!(outcomes[1].output_name(), NOT_APPLICABLE);
        assert_eq!(outcomes[0].week(), Some(WeekKey { year: 2024, week: 11 }));
    }

    #[test]
    fn test_most_common_week_is_order_independent() {
        // Two files in week 11, one in week 12, the week 12 file last.
        let outcomes = [
            outcome(1, Some((2024, 3, 11))),
            outcome(2, Some((2024, 3, 12))),
            outcome(3, Some((2024, 3, 18))),
        ];
        let week = result_of(&outcomes).representative_week(WeekPolicy::MostCommon).unwrap();
        assert_eq!(week, WeekKey { year: 2024, week: 11 });
    }

    #[test]
    fn test_most_common_tie_goes_to_latest_week() {
        let outcomes = [outcome(1, Some((2024, 3, 18))), outcome(2, Some((2024, 3, 11)))];
        let week = result_of(&outcomes).representative_week(WeekPolicy::MostCommon).unwrap();
        assert_eq!(week, WeekKey { year: 2024, week: 12 });
    }

    #[test]
    fn test_uniform_policy_rejects_mixed_weeks() {
        let outcomes = [outcome(1, Some((2024, 3, 11))), outcome(2, Some((2024, 3, 18)))];
        let err = result_of(&outcomes).representative_week(WeekPolicy::Uniform).unwrap_err();
        assert_eq!(err.to_string(), "passed files span several ISO weeks: 2024_W11, 2024_W12");

        let same = [outcome(1, Some((2024, 3, 11))), outcome(2, Some((2024, 3, 17)))];
        let week = result_of(&same).representative_week(WeekPolicy::Uniform).unwrap();
        assert_eq!(week, WeekKey { year: 2024, week: 11 });
    }

    #[test]
    fn test_no_passed_files_gives_zero_week() {
        let outcomes = [outcome(1, None)];
        let week = result_of(&outcomes).representative_week(WeekPolicy::Uniform).unwrap();
        assert_eq!(week, WeekKey::default());
    }

    fn entry(name: &str) -> SourceEntry {
        SourceEntry {
            name: name.to_string(),
            path: PathBuf::from(name),
            is_dir: false,
        }
    }

    fn prepared(output_name: &str) -> Result<PreparedFile, MinifyError> {
        Ok(PreparedFile {
            output_name: output_name.to_string(),
            date_key: DateKey::default(),
            doc: FilteredDocument::default(),
        })
    }

    #[test]
    fn test_later_duplicate_output_name_fails() {
        let entries = [entry("RD-A-1.xml"), entry("RD-B-1.xml"), entry("RD-A-2.xml"), entry("RD-C-1.xml")];
        let mut files = vec![
            prepared("A.xml"),
            Err(MinifyError::FileName { name: "RD-B-1.xml".into() }),
            prepared("A.xml"),
            prepared("C.xml"),
        ];

        claim_output_names(&entries, &mut files);

        assert!(files[0].is_ok());
        assert!(matches!(&files[1], Err(MinifyError::FileName { .. })));
        assert!(matches!(
            &files[2],
            Err(MinifyError::DuplicateOutput { name, claimed_by }) if name == "A.xml" && claimed_by == "RD-A-1.xml"
        ));
        assert!(files[3].is_ok());
    }

    #[test]
    fn test_run_indexed_keeps_index_order() {
        let expected: Vec<usize> = (0..50).map(|i| i * 2).collect();
        for jobs in [1, 4] {
            let minifier = Minifier::new(MinifyConfig::new("in", "out").with_jobs(jobs));
            assert_eq!(minifier.run_indexed(50, |i| i * 2), expected);
        }
        let minifier = Minifier::new(MinifyConfig::new("in", "out").with_jobs(4));
        assert!(minifier.run_indexed(0, |i| i).is_empty());
    }

    #[test]
    fn test_workspace_replaces_stale_directory_and_cleans_up() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("ws");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("stale.xml"), "old").unwrap();

        let workspace = Workspace::prepare(path.clone()).unwrap();
        assert!(path.exists());
        assert!(!path.join("stale.xml").exists());

        workspace.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("ws");
        {
            let workspace = Workspace::prepare(path.clone()).unwrap();
            fs::write(workspace.path().join("out.xml"), "<x/>").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_workspace_prepare_failure_is_reported() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        fs::write(&blocker, "not a directory").unwrap();

        let err = Workspace::prepare(blocker.join("ws")).unwrap_err();
        assert!(matches!(err, MinifyError::Workspace { .. }));
    }

    #[test]
    fn test_list_entries_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.xml"), "").unwrap();
        fs::write(dir.path().join("a.xml"), "").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();

        let entries = list_entries(dir.path()).unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.is_dir)).collect();
        assert_eq!(names, vec![("a.xml", false), ("b.xml", false), ("c", true)]);
    }

    #[test]
    fn test_list_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_entries(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, MinifyError::ListInput { .. }));
        assert!(!err.is_per_file());
    }
}

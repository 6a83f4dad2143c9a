//! # openmedia-minify
//!
//! Batch minifier for OpenMedia as-run exports.
//!
//! An export is a UTF-16 XML document written one element per line. Most of
//! its size is field entries that carry no value:
//!
//! ```text
//! <OM_FIELD FieldType = "1" FieldID = "8" FieldName = "Title" IsEmpty = "yes"><OM_STRING></OM_STRING></OM_FIELD>
//! ```
//!
//! For every eligible file in an input directory the minifier
//!
//! 1. decodes it from UTF-16 and drops empty field lines, keeping the
//!    `OM_HEADER`/`OM_OBJECT`/`OM_RECORD` structure intact,
//! 2. reads the broadcast date from field 1004 and renames the output to
//!    `<prefix>_<Weekday>_W<week>_<year>_<month>_<day>.xml`,
//! 3. validates the source and the written UTF-8 output; a bad output is
//!    renamed to `*_MALFORMED.xml`.
//!
//! The minified set and the untouched originals are then packed into
//! `<year>_W<week>_MINIFIED.zip` and `<year>_W<week>_ORIGINAL.zip`.
//!
//! ## Line Rules
//!
//! Lines are classified by literal substring matching, in order:
//! 1. `IsEmpty = "yes"` and `OM_FIELD` present, no container tag → dropped
//! 2. `<?xml` anywhere but the first line → dropped
//! 3. Otherwise kept, with `UTF-16` rewritten to `UTF-8`

pub mod archive;
pub mod batch;
pub mod config;
pub mod date_key;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod filter;
pub mod naming;
pub mod validate;

pub use archive::{ArchiveError, ArchiveSummary, Archiver, ZipArchiver};
pub use batch::{
    BatchReport, BatchResult, BatchState, MinifiedFile, Minifier, ProcessingOutcome, SourceEntry, Workspace,
};
pub use config::{MinifyConfig, MissingDatePolicy, WeekPolicy};
pub use date_key::{extract_date_key, DateKey, DateKeyError, DateKeyScanner, WeekKey};
pub use decoder::{DecodeError, Endianness, Utf16Lines};
pub use encoder::Encoder;
pub use error::{MinifyError, ValidationStage};
pub use filter::{filter_lines, DropReason, FilteredDocument, LineDecision, LineFilter};
pub use naming::{archive_name, derive_output_name, mark_corrupt, ArchiveKind};
pub use validate::{SchemaValidator, ValidationError, ValidationIssue, WellFormedValidator};

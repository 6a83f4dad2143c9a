//! Line filter
//!
//! Drops empty field entries while keeping the structural tags around them.
//! Decisions are made per line by literal substring matching; the filter has
//! no notion of nesting or well-formedness.

/// Marker carried by fields with no value
pub const EMPTY_MARKER: &str = r#"IsEmpty = "yes""#;
/// Field-level tag
pub const FIELD_TAG: &str = "OM_FIELD";
/// Container tags that must survive even when flagged empty
pub const CONTAINER_TAGS: [&str; 3] = ["OM_HEADER", "OM_OBJECT", "OM_RECORD"];
/// Start of an XML declaration
pub const DECLARATION_MARKER: &str = "<?xml";

const SOURCE_ENCODING: &str = "UTF-16";
const TARGET_ENCODING: &str = "UTF-8";

/// Why a line was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Field entry flagged as empty
    EmptyField,
    /// XML declaration that is not on the first line
    DuplicateDeclaration,
}

/// Outcome for a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineDecision {
    /// Keep the line, possibly rewritten
    Keep(String),
    /// Drop the line
    Drop(DropReason),
}

/// Classify one line. `first` is true only for the first line of a file.
pub fn classify(line: &str, first: bool) -> LineDecision {
    if is_empty_field(line) {
        return LineDecision::Drop(DropReason::EmptyField);
    }
    if !first && line.contains(DECLARATION_MARKER) {
        return LineDecision::Drop(DropReason::DuplicateDeclaration);
    }
    if line.contains(SOURCE_ENCODING) {
        LineDecision::Keep(line.replace(SOURCE_ENCODING, TARGET_ENCODING))
    } else {
        LineDecision::Keep(line.to_string())
    }
}

fn is_empty_field(line: &str) -> bool {
    line.contains(EMPTY_MARKER)
        && line.contains(FIELD_TAG)
        && !CONTAINER_TAGS.iter().any(|tag| line.contains(tag))
}

/// Result of filtering one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredDocument {
    /// Retained lines, in order, without terminators
    pub lines: Vec<String>,
    pub kept: usize,
    pub dropped: usize,
}

impl FilteredDocument {
    /// Total number of lines seen
    pub fn total(&self) -> usize {
        self.kept + self.dropped
    }

    /// Kept lines as a percentage of all lines (100 for an empty document)
    pub fn ratio(&self) -> f64 {
        if self.total() == 0 {
            return 100.0;
        }
        self.kept as f64 / self.total() as f64 * 100.0
    }
}

/// Incremental filter fed one decoded line at a time
#[derive(Debug, Default)]
pub struct LineFilter {
    seen: usize,
    doc: FilteredDocument,
}

impl LineFilter {
    /// Create a filter positioned before the first line
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and record the next line of the document. Returns whether
    /// the line was kept.
    pub fn push(&mut self, line: &str) -> bool {
        let decision = classify(line, self.seen == 0);
        self.seen += 1;
        match decision {
            LineDecision::Keep(text) => {
                self.doc.kept += 1;
                self.doc.lines.push(text);
                true
            }
            LineDecision::Drop(_) => {
                self.doc.dropped += 1;
                false
            }
        }
    }

    /// Consume the filter and return the kept lines with counts
    pub fn finish(self) -> FilteredDocument {
        self.doc
    }
}

/// Filter a complete sequence of lines
pub fn filter_lines<I, S>(lines: I) -> FilteredDocument
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut filter = LineFilter::new();
    for line in lines {
        filter.push(line.as_ref());
    }
    filter.finish()
}

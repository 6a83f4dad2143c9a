//! Document validation
//!
//! The pipeline only needs a yes/no answer with a line-numbered reason, so
//! validation sits behind [`SchemaValidator`]. [`WellFormedValidator`] is the
//! default: it checks that a buffer is a single well-formed XML document.

use std::fmt;

use thiserror::Error;

use crate::decoder::{decode_to_string, Endianness};

/// One problem found in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// A failed validation. Always carries at least one issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", first_issue(.issues))]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

fn first_issue(issues: &[ValidationIssue]) -> String {
    issues.first().map(ToString::to_string).unwrap_or_else(|| "invalid document".to_string())
}

impl ValidationError {
    pub fn single(line: usize, message: impl Into<String>) -> Self {
        Self {
            issues: vec![ValidationIssue { line, message: message.into() }],
        }
    }

    /// The issue reported to the user
    pub fn first(&self) -> Option<&ValidationIssue> {
        self.issues.first()
    }
}

/// Validates a complete document held in memory
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, document: &[u8]) -> Result<(), ValidationError>;
}

impl<T: SchemaValidator + ?Sized> SchemaValidator for &T {
    fn validate(&self, document: &[u8]) -> Result<(), ValidationError> {
        (**self).validate(document)
    }
}

impl<T: SchemaValidator + ?Sized> SchemaValidator for Box<T> {
    fn validate(&self, document: &[u8]) -> Result<(), ValidationError> {
        (**self).validate(document)
    }
}

/// Character encoding detected from the leading bytes of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectedEncoding {
    Utf8,
    Utf16(Endianness),
}

fn detect_encoding(bytes: &[u8]) -> DetectedEncoding {
    match bytes {
        [0xFF, 0xFE, ..] | [b'<', 0, ..] => DetectedEncoding::Utf16(Endianness::Little),
        [0xFE, 0xFF, ..] | [0, b'<', ..] => DetectedEncoding::Utf16(Endianness::Big),
        _ => DetectedEncoding::Utf8,
    }
}

/// Checks XML well-formedness.
///
/// Accepts UTF-8 (optional BOM) and UTF-16 documents. Reports the first
/// problem found, in the manner of a non-validating XML parser.
#[derive(Debug, Clone, Default)]
pub struct WellFormedValidator {}

impl WellFormedValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {}
    }

    fn decode(bytes: &[u8]) -> Result<(String, DetectedEncoding), ValidationError> {
        let encoding = detect_encoding(bytes);
        let text = match encoding {
            DetectedEncoding::Utf16(endianness) => decode_to_string(bytes, endianness).map_err(|e| {
                ValidationError::single(e.line().unwrap_or(1), format!("input conversion failed: {}", e))
            })?,
            DetectedEncoding::Utf8 => {
                let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
                match std::str::from_utf8(bytes) {
                    Ok(text) => text.to_string(),
                    Err(e) => {
                        let line = bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1;
                        return Err(ValidationError::single(
                            line,
                            "input is not proper UTF-8, indicate encoding",
                        ));
                    }
                }
            }
        };
        Ok((text, encoding))
    }
}

impl SchemaValidator for WellFormedValidator {
    fn validate(&self, document: &[u8]) -> Result<(), ValidationError> {
        let (text, encoding) = Self::decode(document)?;
        Checker::new(&text, encoding).run()
    }
}

struct Checker<'a> {
    text: &'a str,
    bytes: &'a [u8],
    encoding: DetectedEncoding,
    pos: usize,
    stack: Vec<&'a str>,
    seen_root: bool,
    /// General entities declared in the DOCTYPE internal subset
    entities: Vec<&'a str>,
}

impl<'a> Checker<'a> {
    fn new(text: &'a str, encoding: DetectedEncoding) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            encoding,
            pos: 0,
            stack: Vec::new(),
            seen_root: false,
            entities: Vec::new(),
        }
    }

    fn line_at(&self, offset: usize) -> usize {
        self.bytes[..offset.min(self.bytes.len())].iter().filter(|&&b| b == b'\n').count() + 1
    }

    fn fail(&self, offset: usize, message: impl Into<String>) -> ValidationError {
        ValidationError::single(self.line_at(offset), message)
    }

    fn find(&self, from: usize, needle: &str) -> Option<usize> {
        self.text[from..].find(needle).map(|i| from + i)
    }

    fn run(mut self) -> Result<(), ValidationError> {
        while self.pos < self.bytes.len() {
            let next = self.find(self.pos, "<").unwrap_or(self.bytes.len());
            self.check_text(self.pos, next)?;
            self.pos = next;
            if next < self.bytes.len() {
                self.markup()?;
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(self.fail(self.bytes.len(), format!("Premature end of data in tag {}", open)));
        }
        if !self.seen_root {
            return Err(self.fail(self.bytes.len(), "Document is empty"));
        }
        Ok(())
    }

    fn check_text(&self, start: usize, end: usize) -> Result<(), ValidationError> {
        let text = &self.text[start..end];
        if self.stack.is_empty() {
            if let Some(i) = text.find(|c: char| !c.is_whitespace()) {
                let message = if self.seen_root {
                    "Extra content at the end of the document"
                } else {
                    "Start tag expected, '<' not found"
                };
                return Err(self.fail(start + i, message));
            }
            return Ok(());
        }
        self.check_references(start, end)
    }

    /// Every `&` in `start..end` must open a character reference or a
    /// reference to a predefined or declared entity.
    fn check_references(&self, start: usize, end: usize) -> Result<(), ValidationError> {
        let mut offset = start;
        while let Some(i) = self.text[offset..end].find('&') {
            let at = offset + i;
            let body = &self.text[at + 1..end];
            let name = match body.find(';') {
                Some(e) if e > 0 => &body[..e],
                _ => return Err(self.fail(at, "xmlParseEntityRef: no name")),
            };
            if let Some(number) = name.strip_prefix('#') {
                let code = match number.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => number.parse::<u32>().ok(),
                };
                if !code.and_then(char::from_u32).map_or(false, is_xml_char) {
                    return Err(self.fail(at, format!("xmlParseCharRef: invalid xmlChar value {}", number)));
                }
            } else if !is_name(name) {
                return Err(self.fail(at, "xmlParseEntityRef: no name"));
            } else if !PREDEFINED_ENTITIES.iter().any(|e| *e == name) && !self.entities.iter().any(|e| *e == name) {
                return Err(self.fail(at, format!("Entity '{}' not defined", name)));
            }
            offset = at + name.len() + 2;
        }
        Ok(())
    }

    fn markup(&mut self) -> Result<(), ValidationError> {
        let start = self.pos;
        let text = self.text;
        let rest = &text[start..];
        if rest.starts_with("<?") {
            self.processing_instruction(start)
        } else if rest.starts_with("<!--") {
            let end = self
                .find(start + 4, "-->")
                .ok_or_else(|| self.fail(start, "Comment not terminated"))?;
            self.pos = end + 3;
            Ok(())
        } else if rest.starts_with("<![CDATA[") {
            if self.stack.is_empty() {
                return Err(self.fail(start, "CDATA section outside the root element"));
            }
            let end = self
                .find(start + 9, "]]>")
                .ok_or_else(|| self.fail(start, "CData section not finished"))?;
            self.pos = end + 3;
            Ok(())
        } else if rest.starts_with("<!") {
            if self.seen_root {
                return Err(self.fail(start, "DOCTYPE after the root element"));
            }
            self.declaration(start)
        } else if rest.starts_with("</") {
            self.end_tag(start)
        } else {
            self.start_tag(start)
        }
    }

    /// `<!DOCTYPE ...>`, possibly with an internal subset in brackets
    fn declaration(&mut self, start: usize) -> Result<(), ValidationError> {
        let text = self.text;
        let unterminated = || self.fail(start, "DOCTYPE not terminated");
        let close = self.find(start, ">").ok_or_else(unterminated)?;
        let end = match self.find(start, "[").filter(|&open| open < close) {
            Some(open) => {
                let subset_end = self.find(open, "]").ok_or_else(unterminated)?;
                self.entities.extend(declared_entities(&text[open + 1..subset_end]));
                let after = self.skip_whitespace(subset_end + 1);
                if self.bytes.get(after) != Some(&b'>') {
                    return Err(self.fail(after, "DOCTYPE improperly terminated"));
                }
                after
            }
            None => close,
        };
        self.pos = end + 1;
        Ok(())
    }

    fn processing_instruction(&mut self, start: usize) -> Result<(), ValidationError> {
        let end = self
            .find(start + 2, "?>")
            .ok_or_else(|| self.fail(start, "PI not terminated"))?;
        let body = &self.text[start + 2..end];
        let target = body.split(|c: char| c.is_whitespace()).next().unwrap_or("");
        if target.is_empty() {
            return Err(self.fail(start, "xmlParsePI : no target name"));
        }
        if target.eq_ignore_ascii_case("xml") {
            if start != 0 {
                return Err(self.fail(start, "XML declaration allowed only at the start of the document"));
            }
            if self.encoding == DetectedEncoding::Utf8 {
                if let Some(label) = declared_encoding(body) {
                    if label.to_ascii_uppercase().starts_with("UTF-16") {
                        return Err(self.fail(start, "Document labelled UTF-16 but has UTF-8 content"));
                    }
                }
            }
        }
        self.pos = end + 2;
        Ok(())
    }

    fn end_tag(&mut self, start: usize) -> Result<(), ValidationError> {
        let end = self
            .find(start, ">")
            .ok_or_else(|| self.fail(start, "expected '>'"))?;
        let name = self.text[start + 2..end].trim_end();
        match self.stack.pop() {
            Some(open) if open == name => {
                self.pos = end + 1;
                Ok(())
            }
            Some(open) => Err(self.fail(
                start,
                format!("Opening and ending tag mismatch: {} and {}", open, name),
            )),
            None => Err(self.fail(start, format!("Unexpected end tag : {}", name))),
        }
    }

    fn start_tag(&mut self, start: usize) -> Result<(), ValidationError> {
        let text = self.text;
        let name_start = start + 1;
        let name_end = text[name_start..]
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .map(|i| name_start + i)
            .unwrap_or(self.bytes.len());
        let name = &text[name_start..name_end];
        if !is_name(name) {
            return Err(self.fail(start, "StartTag: invalid element name"));
        }
        if self.stack.is_empty() && self.seen_root {
            return Err(self.fail(start, "Extra content at the end of the document"));
        }

        let (end, self_closing) = self.attributes(name_end, name)?;
        self.seen_root = true;
        if !self_closing {
            self.stack.push(name);
        }
        self.pos = end;
        Ok(())
    }

    /// Scan attributes up to the end of the tag. Returns the offset after
    /// the tag and whether it was self-closing.
    fn attributes(&self, mut pos: usize, element: &str) -> Result<(usize, bool), ValidationError> {
        let mut seen: Vec<&str> = Vec::new();
        loop {
            pos = self.skip_whitespace(pos);
            let rest = &self.text[pos..];
            if rest.starts_with("/>") {
                return Ok((pos + 2, true));
            }
            if rest.starts_with('>') {
                return Ok((pos + 1, false));
            }
            if rest.is_empty() || rest.starts_with('<') {
                return Err(self.fail(pos, format!("Couldn't find end of Start Tag {}", element)));
            }

            let name_end = rest
                .find(|c: char| c.is_whitespace() || c == '=' || c == '>' || c == '/')
                .map(|i| pos + i)
                .unwrap_or(self.bytes.len());
            let name = &self.text[pos..name_end];
            if !is_name(name) {
                return Err(self.fail(pos, format!("error parsing attribute name in {}", element)));
            }
            if seen.contains(&name) {
                return Err(self.fail(pos, format!("Attribute {} redefined", name)));
            }
            seen.push(name);

            pos = self.skip_whitespace(name_end);
            if self.bytes.get(pos) != Some(&b'=') {
                return Err(self.fail(pos, format!("Specification mandates value for attribute {}", name)));
            }
            pos = self.skip_whitespace(pos + 1);
            let quote = match self.bytes.get(pos) {
                Some(&q) if q == b'"' || q == b'\'' => q as char,
                _ => return Err(self.fail(pos, "AttValue: \" or ' expected")),
            };
            let close = self.text[pos + 1..]
                .find(quote)
                .map(|i| pos + 1 + i)
                .ok_or_else(|| self.fail(pos, "AttValue: ' expected"))?;
            if self.text[pos + 1..close].contains('<') {
                return Err(self.fail(pos, "Unescaped '<' not allowed in attributes values"));
            }
            self.check_references(pos + 1, close)?;
            pos = close + 1;
        }
    }

    fn skip_whitespace(&self, pos: usize) -> usize {
        self.text[pos..]
            .find(|c: char| !c.is_whitespace())
            .map(|i| pos + i)
            .unwrap_or(self.bytes.len())
    }
}

fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

const PREDEFINED_ENTITIES: [&str; 5] = ["amp", "lt", "gt", "quot", "apos"];

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Names from `<!ENTITY name ...>` declarations; parameter entities are skipped
fn declared_entities(subset: &str) -> impl Iterator<Item = &str> {
    subset.split("<!ENTITY").skip(1).filter_map(|decl| {
        let name = decl.split_whitespace().next()?;
        (name != "%" && is_name(name)).then_some(name)
    })
}

fn declared_encoding(declaration: &str) -> Option<&str> {
    let at = declaration.find("encoding")?;
    let rest = declaration[at + "encoding".len()..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|&c| c == '"' || c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
}

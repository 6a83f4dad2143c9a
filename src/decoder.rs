//! UTF-16 decoder
//!
//! OpenMedia exports are UTF-16 with an optional byte-order mark. Without a
//! mark the stream is read as little-endian.

use std::io::{self, ErrorKind, Read};

use thiserror::Error;

const BOM_LE: [u8; 2] = [0xFF, 0xFE];
const BOM_BE: [u8; 2] = [0xFE, 0xFF];

/// Errors produced while decoding a UTF-16 stream
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("read error: {0}")]
    Io(#[from] io::Error),

    #[error("unpaired surrogate 0x{unit:04X} on line {line}")]
    UnpairedSurrogate { line: usize, unit: u16 },

    #[error("stream ends with a truncated code unit on line {line}")]
    TruncatedUnit { line: usize },
}

impl DecodeError {
    /// Line on which decoding failed (1-based), if known
    pub fn line(&self) -> Option<usize> {
        match self {
            DecodeError::Io(_) => None,
            DecodeError::UnpairedSurrogate { line, .. } | DecodeError::TruncatedUnit { line } => Some(*line),
        }
    }
}

/// Byte order of the code units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    fn unit(self, bytes: [u8; 2]) -> u16 {
        match self {
            Endianness::Little => u16::from_le_bytes(bytes),
            Endianness::Big => u16::from_be_bytes(bytes),
        }
    }
}

/// Read failures seen while pulling code units
enum UnitFault {
    Io(io::Error),
    Truncated,
}

/// Raw code units of a UTF-16 stream.
///
/// Ends early on a read failure or a dangling byte; the cause is kept in
/// `fault` for the char decoder to report.
struct Utf16Units<R> {
    reader: R,
    endianness: Option<Endianness>,
    fallback: Endianness,
    fault: Option<UnitFault>,
}

impl<R: Read> Utf16Units<R> {
    fn read_pair(&mut self) -> Result<Option<[u8; 2]>, UnitFault> {
        let mut buf = [0u8; 2];
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(UnitFault::Io(e)),
            }
        }
        match filled {
            0 => Ok(None),
            1 => Err(UnitFault::Truncated),
            _ => Ok(Some(buf)),
        }
    }

    fn next_pair(&mut self) -> Option<[u8; 2]> {
        if self.fault.is_some() {
            return None;
        }
        match self.read_pair() {
            Ok(pair) => pair,
            Err(fault) => {
                self.fault = Some(fault);
                None
            }
        }
    }
}

impl<R: Read> Iterator for Utf16Units<R> {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        let mut bytes = self.next_pair()?;
        let endianness = match self.endianness {
            Some(endianness) => endianness,
            None => {
                let detected = match bytes {
                    BOM_LE => Some(Endianness::Little),
                    BOM_BE => Some(Endianness::Big),
                    _ => None,
                };
                if detected.is_some() {
                    bytes = self.next_pair()?;
                }
                let endianness = detected.unwrap_or(self.fallback);
                self.endianness = Some(endianness);
                endianness
            }
        };
        Some(endianness.unit(bytes))
    }
}

/// Decodes UTF-16 code units into chars.
///
/// The byte order is taken from a leading BOM when one is present (the BOM is
/// consumed), otherwise from the fallback given at construction.
pub struct Utf16Chars<R> {
    units: Utf16Units<R>,
    line: usize,
    done: bool,
}

impl<R: Read> Utf16Chars<R> {
    /// Decode with BOM detection, defaulting to little-endian
    pub fn new(reader: R) -> Self {
        Self::with_fallback(reader, Endianness::Little)
    }

    /// Decode with BOM detection, using `fallback` when no BOM is present
    pub fn with_fallback(reader: R, fallback: Endianness) -> Self {
        Self {
            units: Utf16Units {
                reader,
                endianness: None,
                fallback,
                fault: None,
            },
            line: 1,
            done: false,
        }
    }

    fn decode_next(&mut self) -> Result<Option<char>, DecodeError> {
        // A fresh decoder per char is enough: it only holds back a unit after
        // an unpaired surrogate, and decoding stops at the first error.
        let decoded = char::decode_utf16(self.units.by_ref()).next();
        match self.units.fault.take() {
            Some(UnitFault::Io(e)) => return Err(e.into()),
            Some(UnitFault::Truncated) => return Err(DecodeError::TruncatedUnit { line: self.line }),
            None => {}
        }
        match decoded {
            None => Ok(None),
            Some(Ok(ch)) => {
                if ch == '\n' {
                    self.line += 1;
                }
                Ok(Some(ch))
            }
            Some(Err(e)) => Err(DecodeError::UnpairedSurrogate {
                line: self.line,
                unit: e.unpaired_surrogate(),
            }),
        }
    }
}

impl<R: Read> Iterator for Utf16Chars<R> {
    type Item = Result<char, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.decode_next() {
            Ok(Some(ch)) => Some(Ok(ch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazy line reader over a UTF-16 stream.
///
/// Lines are yielded without their terminator; a trailing `\r` is stripped.
/// A final line without a terminating newline is still yielded, an empty
/// remainder after the last newline is not. The sequence ends after the
/// first error.
pub struct Utf16Lines<R> {
    chars: Utf16Chars<R>,
}

impl<R: Read> Utf16Lines<R> {
    /// Create a line reader, detecting the byte order from a BOM
    pub fn new(reader: R) -> Self {
        Self { chars: Utf16Chars::new(reader) }
    }
}

impl<R: Read> Iterator for Utf16Lines<R> {
    type Item = Result<String, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        let mut saw_any = false;
        for ch in self.chars.by_ref() {
            let ch = match ch {
                Ok(ch) => ch,
                Err(e) => return Some(Err(e)),
            };
            saw_any = true;
            if ch == '\n' {
                if line.ends_with('\r') {
                    line.pop();
                }
                return Some(Ok(line));
            }
            line.push(ch);
        }
        if !saw_any {
            return None;
        }
        if line.ends_with('\r') {
            line.pop();
        }
        Some(Ok(line))
    }
}

/// Decode a whole UTF-16 stream into a string, keeping line terminators
pub fn decode_to_string<R: Read>(reader: R, fallback: Endianness) -> Result<String, DecodeError> {
    Utf16Chars::with_fallback(reader, fallback).collect()
}

/// Encode text as UTF-16LE with a leading BOM
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&BOM_LE);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

//! Minified document writer

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Serializes kept lines as UTF-8, each terminated with `\n`
pub struct Encoder {
    // Currently stateless
}

impl Encoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self {}
    }

    /// Encode lines to a byte buffer
    pub fn encode<S: AsRef<str>>(&self, lines: &[S]) -> Vec<u8> {
        let mut out = Vec::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
        for line in lines {
            out.extend_from_slice(line.as_ref().as_bytes());
            out.push(b'\n');
        }
        out
    }

    /// Encode lines directly to a writer
    pub fn encode_to_writer<S: AsRef<str>, W: Write>(&self, lines: &[S], writer: W) -> io::Result<()> {
        let mut writer = BufWriter::new(writer);
        for line in lines {
            writer.write_all(line.as_ref().as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }

    /// Encode lines to a new file. Fails if `path` already exists, so two
    /// inputs deriving the same name cannot silently overwrite each other.
    pub fn encode_to_file<S: AsRef<str>>(&self, lines: &[S], path: &Path) -> io::Result<()> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        self.encode_to_writer(lines, file)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

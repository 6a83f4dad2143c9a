#![allow(dead_code)]

use openmedia_minify::decoder::encode_utf16le;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Input, output and workspace-root directories for one test run
pub struct TestEnv {
    _tmp: TempDir,
    pub input: PathBuf,
    pub output: PathBuf,
    pub scratch: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let input = tmp.path().join("input");
        let output = tmp.path().join("output");
        let scratch = tmp.path().join("scratch");
        for dir in [&input, &output, &scratch] {
            fs::create_dir_all(dir).expect("create test dir");
        }
        Self {
            _tmp: tmp,
            input,
            output,
            scratch,
        }
    }

    /// Write an export as UTF-16LE with BOM
    pub fn add_export(&self, name: &str, document: &str) -> PathBuf {
        let path = self.input.join(name);
        fs::write(&path, encode_utf16le(document)).expect("write export");
        path
    }

    pub fn workspace(&self) -> PathBuf {
        self.scratch.join("workspace")
    }
}

/// A small export dated `date` (YYYYMMDD) with one empty and one filled field
pub fn export(date: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-16"?>
<OPENMEDIA>
<OM_SERVER/>
<OM_OBJECT SystemID = "3fc88c26" ObjectID = "0001" TemplateID = "fffffffa" TemplateType = "1" TemplateName = "Radio Rundown">
<OM_HEADER>
<OM_FIELD FieldType = "3" FieldID = "1004" FieldName = "Start" IsEmpty = "no"><OM_DATETIME>{}T050000,000</OM_DATETIME></OM_FIELD>
<OM_FIELD FieldType = "1" FieldID = "8" FieldName = "Title" IsEmpty = "no"><OM_STRING>Morning show</OM_STRING></OM_FIELD>
<OM_FIELD FieldType = "1" FieldID = "12" FieldName = "Editor" IsEmpty = "yes"><OM_STRING></OM_STRING></OM_FIELD>
</OM_HEADER>
<OM_RECORD RecordID = "1">
<OM_FIELD FieldType = "1" FieldID = "421" FieldName = "Note" IsEmpty = "yes"><OM_STRING></OM_STRING></OM_FIELD>
<OM_FIELD FieldType = "2" FieldID = "5" FieldName = "Duration" IsEmpty = "no"><OM_INT32>180</OM_INT32></OM_FIELD>
</OM_RECORD>
</OM_OBJECT>
</OPENMEDIA>
"#,
        date
    )
}

/// An export whose closing tags do not match
pub fn broken_export(date: &str) -> String {
    export(date).replace("</OM_RECORD>", "</OM_RECORDS>")
}

/// Names of the entries in a zip archive
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("open archive");
    let mut zip = zip::ZipArchive::new(file).expect("read archive");
    (0..zip.len())
        .map(|i| zip.by_index(i).expect("archive entry").name().to_string())
        .collect()
}

pub fn dir_names(path: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(path)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

//! Readers for the raw corpus formats.
//!
//! Two formats are supported: line files holding one item per line with a
//! label implied by the file, and delimited record files with a text column
//! and a sentiment-code column. Bytes are decoded as UTF-8 with a Latin-1
//! fallback and then folded to ASCII.

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

use csv::ReaderBuilder;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::analysis::{decode_bytes, transliterate};
use crate::config::RecordSourceConfig;
use crate::corpus::document::{Document, Label};
use crate::error::{Result, SentivoteError};

lazy_static! {
    /// A value exported as a Python bytes literal: `b'...'` or `b"..."`.
    static ref BYTES_LITERAL: Regex = Regex::new(r#"(?s)^b'(.*)'$|^b"(.*)"$"#).unwrap();
}

/// Read a line file where every non-blank line is one document with `label`.
pub fn read_line_file(path: &Path, label: Label) -> Result<Vec<Document>> {
    let bytes = fs::read(path).map_err(|e| unavailable(path, e))?;
    let text = transliterate(&decode_bytes(&bytes));

    let documents: Vec<Document> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Document::new(line, label))
        .collect();

    debug!(
        "Read {} {} documents from {}",
        documents.len(),
        label,
        path.display()
    );
    Ok(documents)
}

/// Read a delimited record file. Records whose sentiment code is neither
/// positive nor negative, or that are too short to hold both columns, are
/// dropped.
pub fn read_record_file(source: &RecordSourceConfig) -> Result<Vec<Document>> {
    let file = File::open(&source.path).map_err(|e| unavailable(&source.path, e))?;

    let mut reader = ReaderBuilder::new()
        .has_headers(source.has_headers)
        .delimiter(source.delimiter as u8)
        .flexible(true)
        .from_reader(file);

    let mut documents = Vec::new();
    let mut dropped = 0usize;

    for record in reader.byte_records() {
        let record = record?;
        let (Some(raw_text), Some(raw_label)) = (
            record.get(source.text_column),
            record.get(source.label_column),
        ) else {
            dropped += 1;
            continue;
        };

        let code = decode_bytes(raw_label);
        let Some(label) = Label::from_code(unwrap_bytes_literal(&code)) else {
            dropped += 1;
            continue;
        };

        let text = transliterate(unwrap_bytes_literal(&decode_bytes(raw_text)));
        let text = text.trim();
        if text.is_empty() {
            dropped += 1;
            continue;
        }

        documents.push(Document::new(text, label));
    }

    debug!(
        "Read {} documents from {} ({} records dropped)",
        documents.len(),
        source.path.display(),
        dropped
    );
    Ok(documents)
}

/// Strip a `b'...'` / `b"..."` wrapper if present.
pub fn unwrap_bytes_literal(value: &str) -> &str {
    let trimmed = value.trim();
    match BYTES_LITERAL.captures(trimmed) {
        Some(captures) => captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str())
            .unwrap_or(trimmed),
        None => trimmed,
    }
}

fn unavailable(path: &Path, error: std::io::Error) -> SentivoteError {
    if error.kind() == ErrorKind::NotFound {
        SentivoteError::corpus_unavailable(format!("{} not found", path.display()))
    } else {
        SentivoteError::corpus_unavailable(format!("{}: {}", path.display(), error))
    }
}

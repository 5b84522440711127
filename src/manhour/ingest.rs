use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::PipelineError;
use crate::manhour::table::{self, ColumnPosition, Table};

const START_TIME: ColumnPosition = ColumnPosition::new(5);
const END_TIME: ColumnPosition = ColumnPosition::new(10);
const LEGACY_COMPANY_HEADER: &str = "所属グループ名";
const COMPANY_HEADER: &str = "所属カンパニー名";
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy)]
pub enum SourceEncoding {
    /// UTF-8, dropping one leading byte-order mark.
    Utf8Sig,
    Labeled(&'static Encoding),
}

pub fn resolve_encoding(label: &str) -> Option<SourceEncoding> {
    let trimmed = label.trim();
    if trimmed.eq_ignore_ascii_case("utf-8-sig") || trimmed.eq_ignore_ascii_case("utf_8_sig") {
        return Some(SourceEncoding::Utf8Sig);
    }
    Encoding::for_label(trimmed.as_bytes()).map(SourceEncoding::Labeled)
}

impl SourceEncoding {
    fn decode_strict(self, bytes: &[u8]) -> Option<String> {
        let (encoding, body) = match self {
            Self::Utf8Sig => (UTF_8, bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
            Self::Labeled(encoding) => (encoding, bytes),
        };
        encoding
            .decode_without_bom_handling_and_without_replacement(body)
            .map(|text| text.into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct DecodedSource {
    pub text: String,
    pub encoding: String,
}

/// First encoding that decodes the whole file without a malformed sequence wins.
pub fn decode_source(path: &Path, encodings: &[String]) -> Result<DecodedSource, PipelineError> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    for label in encodings {
        let Some(encoding) = resolve_encoding(label) else {
            continue;
        };
        if let Some(text) = encoding.decode_strict(&bytes) {
            debug!(path = %path.display(), encoding = %label, "decoded source");
            return Ok(DecodedSource {
                text,
                encoding: label.clone(),
            });
        }
    }

    Err(PipelineError::Decode {
        path: path.to_path_buf(),
        tried: encodings.join(", "),
    })
}

/// `H:MM` gains `:00`; anything else is only trimmed.
pub fn normalize_time_of_day(cell: &str) -> String {
    let text = cell.trim();
    match text.matches(':').count() {
        1 => format!("{text}:00"),
        _ => text.to_string(),
    }
}

fn strip_wrapping_quotes(cell: &str) -> Option<&str> {
    if cell.chars().count() >= 2 && cell.starts_with('"') && cell.ends_with('"') {
        Some(&cell[1..cell.len() - 1])
    } else {
        None
    }
}

/// Undo BOM and quote layers some exporters leave on the first header cell.
pub fn normalize_header_first_cell(cell: &str) -> String {
    let mut text = cell.trim_start_matches('\u{feff}').to_string();
    if let Some(inner) = strip_wrapping_quotes(&text) {
        text = inner.replace("\"\"", "\"");
    }
    if let Some(inner) = strip_wrapping_quotes(&text) {
        text = inner.to_string();
    }
    text
}

fn normalize_header(header: &mut [String]) {
    if let Some(first) = header.first_mut() {
        *first = normalize_header_first_cell(first);
    }
    if header.get(3).is_some_and(|name| name == LEGACY_COMPANY_HEADER) {
        header[3] = COMPANY_HEADER.to_string();
    }
}

/// Parses decoded CSV text and applies the header and time-of-day fixes.
pub fn ingest_text(text: &str) -> Result<Table> {
    let records = table::parse_delimited(text, b',')?;
    if records.len() <= 1 {
        return Ok(Table::from_records(records));
    }

    let mut table = Table::from_records(records);
    for row in &mut table.rows {
        START_TIME.map_existing(row, normalize_time_of_day);
        END_TIME.map_existing(row, normalize_time_of_day);
    }
    normalize_header(&mut table.header);
    Ok(table)
}

/// Writes the ingested table as tab-delimited text; returns the data row count.
pub fn write_ingested(decoded: &DecodedSource, output_path: &Path) -> Result<usize> {
    let table = ingest_text(&decoded.text).context("failed to parse source csv")?;
    table::write_tsv(output_path, &table)?;
    Ok(table.len())
}

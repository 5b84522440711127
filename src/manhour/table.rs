use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Header row plus data rows, all raw string cells.
///
/// Rows are allowed to be ragged; every positional access goes through
/// [`ColumnPosition`], which reads missing cells as empty and pads on write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// Splits the first record off as the header.
    pub fn from_records(mut records: Vec<Vec<String>>) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let header = records.remove(0);
        Self::new(header, records)
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Same header, different rows.
    pub fn with_rows(&self, rows: Vec<Vec<String>>) -> Self {
        Self::new(self.header.clone(), rows)
    }

    fn records(&self) -> impl Iterator<Item = &Vec<String>> {
        std::iter::once(&self.header)
            .filter(|header| !header.is_empty())
            .chain(self.rows.iter())
    }
}

/// Column addressed by fixed zero-based position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnPosition {
    pub index: usize,
}

impl ColumnPosition {
    pub const fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn get<'a>(&self, row: &'a [String]) -> &'a str {
        row.get(self.index).map(String::as_str).unwrap_or("")
    }

    pub fn set(&self, row: &mut Vec<String>, value: String) {
        if row.len() <= self.index {
            row.resize(self.index + 1, String::new());
        }
        row[self.index] = value;
    }

    /// Rewrites the cell in place when it exists; short rows are left alone.
    pub fn map_existing(&self, row: &mut [String], f: impl Fn(&str) -> String) {
        if let Some(cell) = row.get_mut(self.index) {
            *cell = f(cell.as_str());
        }
    }
}

/// Column addressed by header name, first candidate present wins.
#[derive(Debug, Clone, Copy)]
pub struct NamedColumn {
    pub candidates: &'static [&'static str],
}

impl NamedColumn {
    pub const fn new(candidates: &'static [&'static str]) -> Self {
        Self { candidates }
    }

    pub fn resolve(&self, header: &[String]) -> Option<ColumnPosition> {
        self.candidates.iter().find_map(|candidate| {
            header
                .iter()
                .position(|name| name.as_str() == *candidate)
                .map(ColumnPosition::new)
        })
    }
}

pub fn parse_delimited(text: &str, delimiter: u8) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut out = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed delimited record")?;
        out.push(record.iter().map(ToOwned::to_owned).collect());
    }
    Ok(out)
}

pub fn read_tsv(path: &Path) -> Result<Table> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let records = parse_delimited(&raw, b'\t')
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(Table::from_records(records))
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Writes `bytes` next to `path` and renames over it, so readers never see a partial file.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = parent_dir(path);
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to stage temp file in {}", dir.display()))?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn encode_tsv(table: &Table) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());
    for record in table.records() {
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("failed to flush tsv buffer: {}", err.error()))
}

pub fn write_tsv(path: &Path, table: &Table) -> Result<()> {
    let bytes = encode_tsv(table)?;
    write_atomic(path, &bytes)
}

/// Replaces the artifact at `path` with a single diagnostic line.
pub fn write_error_artifact(path: &Path, message: &str) -> Result<()> {
    let mut line = message.to_string();
    if !line.ends_with('\n') {
        line.push('\n');
    }
    write_atomic(path, line.as_bytes())
}

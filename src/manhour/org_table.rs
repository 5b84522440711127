use std::path::Path;
use tracing::debug;

use crate::error::{StageError, StageOutcome};
use crate::manhour::ingest;
use crate::manhour::normalize::normalize_org_project_code;
use crate::manhour::table::{self, ColumnPosition, Table};

const ORG_PROJECT_CODE: ColumnPosition = ColumnPosition::new(1);
const ORG_COMPANY: ColumnPosition = ColumnPosition::new(2);

/// One row of the organization table: a project-code prefix owned by a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub project_prefix: String,
    pub company: String,
}

impl MappingEntry {
    pub fn new(project_prefix: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            project_prefix: project_prefix.into(),
            company: company.into(),
        }
    }

    pub fn matches(&self, project_code: &str) -> bool {
        !self.project_prefix.is_empty() && project_code.starts_with(&self.project_prefix)
    }
}

/// Decodes the companion CSV and canonicalizes its project-code column, header included.
pub fn build_org_table(source: &Path, encodings: &[String]) -> StageOutcome<Table> {
    if !source.is_file() {
        return Err(StageError::structural(format!(
            "Error: org table source not found. Path = {}",
            source.display()
        )));
    }

    let decoded = ingest::decode_source(source, encodings).map_err(|err| {
        StageError::unexpected(format!(
            "Error: unexpected exception while reading org table csv. Detail = {err}"
        ))
    })?;
    let mut records = table::parse_delimited(&decoded.text, b',').map_err(|err| {
        StageError::unexpected(format!(
            "Error: unexpected exception while parsing org table csv. Detail = {err:#}"
        ))
    })?;

    for record in &mut records {
        ORG_PROJECT_CODE.map_existing(record, normalize_org_project_code);
    }
    debug!(source = %source.display(), records = records.len(), "org table normalized");
    Ok(Table::from_records(records))
}

/// Mapping entries in file order; the header row is not an entry.
pub fn mapping_entries(org: &Table) -> StageOutcome<Vec<MappingEntry>> {
    if org.column_count() < 3 {
        return Err(StageError::structural(format!(
            "Error: org table must have at least 3 columns. ColumnCount = {}",
            org.column_count()
        )));
    }

    Ok(org
        .rows
        .iter()
        .map(|row| MappingEntry::new(ORG_PROJECT_CODE.get(row), ORG_COMPANY.get(row)))
        .collect())
}

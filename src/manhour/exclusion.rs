use crate::error::{StageError, StageOutcome};
use crate::manhour::table::{ColumnPosition, Table};

const PROJECT_CODE: ColumnPosition = ColumnPosition::new(6);

/// Administrative (`A`) and non-billable (`H`) project categories.
const EXCLUDED_PREFIXES: [char; 2] = ['A', 'H'];

pub fn is_excluded_project(code: &str) -> bool {
    code.starts_with(EXCLUDED_PREFIXES)
}

pub fn remove_excluded_projects(table: &Table) -> StageOutcome<Table> {
    StageError::require_columns(table.column_count(), 7, "G")?;

    let rows = table
        .rows
        .iter()
        .filter(|row| !is_excluded_project(PROJECT_CODE.get(row)))
        .cloned()
        .collect();
    Ok(table.with_rows(rows))
}

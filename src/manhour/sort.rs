use std::cmp::Ordering;

use crate::error::{StageError, StageOutcome};
use crate::manhour::table::{ColumnPosition, Table};

const STAFF_CODE: ColumnPosition = ColumnPosition::new(1);

/// Numeric reading of a staff code; `None` sorts below every number.
fn staff_code_key(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.total_cmp(&y),
    }
}

pub fn sort_by_staff_code(table: &Table) -> StageOutcome<Table> {
    if table.column_count() < 2 {
        return Err(StageError::structural(format!(
            "Error: staff code column (2nd column) does not exist. ColumnCount = {}",
            table.column_count()
        )));
    }

    let mut keyed: Vec<(Option<f64>, &Vec<String>)> = table
        .rows
        .iter()
        .map(|row| (staff_code_key(STAFF_CODE.get(row)), row))
        .collect();
    // `sort_by` is stable: same-day rows for one staff member keep their project order.
    keyed.sort_by(|a, b| compare_keys(a.0, b.0));

    Ok(table.with_rows(keyed.into_iter().map(|(_, row)| row.clone()).collect()))
}

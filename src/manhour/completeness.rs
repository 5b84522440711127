use crate::error::{StageError, StageOutcome};
use crate::manhour::table::{ColumnPosition, Table};

/// Project code, project name, task and work-type columns (G-J).
const CHECKED_COLUMNS: [ColumnPosition; 4] = [
    ColumnPosition::new(6),
    ColumnPosition::new(7),
    ColumnPosition::new(8),
    ColumnPosition::new(9),
];

fn has_sentinel(row: &[String], sentinel: &str) -> bool {
    CHECKED_COLUMNS
        .iter()
        .any(|col| col.get(row).trim() == sentinel)
}

/// Drops every row that still carries the "not entered" sentinel in G-J.
pub fn remove_uninput_rows(table: &Table, sentinel: &str) -> StageOutcome<Table> {
    StageError::require_columns(table.column_count(), 10, "G-J")?;

    let rows = table
        .rows
        .iter()
        .filter(|row| !has_sentinel(row, sentinel))
        .cloned()
        .collect();
    Ok(table.with_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StageErrorKind;

    const SENTINEL: &str = "未入力";

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> Vec<String> {
        (0..10).map(|i| format!("c{i}")).collect()
    }

    #[test]
    fn drops_rows_with_trimmed_sentinel_in_any_checked_column() {
        let table = Table::new(
            header(),
            vec![
                row(&["1", "10", "", "", "", "", "P00001", "x", "y", "z"]),
                row(&["2", "11", "", "", "", "", "P00002", " 未入力 ", "y", "z"]),
                row(&["3", "12", "", "", "", "", "P00003", "x", "y", "未入力"]),
                row(&["4", "13", "", "", "", "", "P00004", "x", "y", "z"]),
            ],
        );

        let out = remove_uninput_rows(&table, SENTINEL).expect("filter");
        let ids: Vec<&str> = out.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
        assert_eq!(out.header, table.header);
    }

    #[test]
    fn substring_matches_and_other_columns_do_not_count() {
        let table = Table::new(
            header(),
            vec![
                row(&["1", "未入力", "", "", "", "", "P1", "未入力あり", "y", "z"]),
                row(&["2", "11", "", "", "", "", "P2", "x", "y", "z", "未入力"]),
            ],
        );

        let out = remove_uninput_rows(&table, SENTINEL).expect("filter");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn short_rows_survive_when_checked_cells_are_missing() {
        let table = Table::new(header(), vec![row(&["1", "10"])]);
        let out = remove_uninput_rows(&table, SENTINEL).expect("filter");
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn narrow_table_is_structural_error() {
        let table = Table::new(row(&["a", "b", "c"]), vec![]);
        let err = remove_uninput_rows(&table, SENTINEL).expect_err("too narrow");
        assert_eq!(err.kind, StageErrorKind::Structural);
        assert!(err.message.contains("ColumnCount = 3"));
    }
}

use crate::error::{StageError, StageOutcome};
use crate::manhour::org_table::MappingEntry;
use crate::manhour::table::{ColumnPosition, Table};

const COMPANY: ColumnPosition = ColumnPosition::new(3);
const PROJECT_CODE: ColumnPosition = ColumnPosition::new(6);

/// Rows split by whether the organization table knows their project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    /// Company column rewritten from the organization table.
    pub matched: Table,
    /// Original company kept, for manual follow-up.
    pub missing: Table,
}

/// First entry in file order whose prefix leads the project code.
///
/// Earlier entries win even when a later one is a longer match.
pub fn find_company<'a>(mappings: &'a [MappingEntry], project_code: &str) -> Option<&'a str> {
    mappings
        .iter()
        .find(|entry| entry.matches(project_code))
        .map(|entry| entry.company.as_str())
}

pub fn reconcile_companies(table: &Table, mappings: &[MappingEntry]) -> StageOutcome<Reconciled> {
    StageError::require_columns(table.column_count(), 7, "D/G")?;

    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for row in &table.rows {
        match find_company(mappings, PROJECT_CODE.get(row)) {
            Some(company) => {
                let mut rewritten = row.clone();
                COMPANY.set(&mut rewritten, company.to_string());
                matched.push(rewritten);
            }
            None => missing.push(row.clone()),
        }
    }

    Ok(Reconciled {
        matched: table.with_rows(matched),
        missing: table.with_rows(missing),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(tag: &str, company: &str, code: &str) -> Vec<String> {
        vec![
            tag.to_string(),
            String::new(),
            String::new(),
            company.to_string(),
            String::new(),
            String::new(),
            code.to_string(),
        ]
    }

    fn table(rows: Vec<Vec<String>>) -> Table {
        Table::new((0..7).map(|i| format!("c{i}")).collect(), rows)
    }

    #[test]
    fn first_listed_prefix_wins_over_longer_match() {
        let mappings = vec![MappingEntry::new("P1", "A"), MappingEntry::new("P10", "B")];
        assert_eq!(find_company(&mappings, "P100"), Some("A"));

        let reversed = vec![MappingEntry::new("P10", "B"), MappingEntry::new("P1", "A")];
        assert_eq!(find_company(&reversed, "P100"), Some("B"));
    }

    #[test]
    fn rows_partition_into_matched_and_missing() {
        let mappings = vec![
            MappingEntry::new("", "never"),
            MappingEntry::new("P00012", "第一インキュ"),
            MappingEntry::new("B1", "本部"),
        ];
        let input = table(vec![
            row("r1", "old1", "P00012"),
            row("r2", "old2", "Z999"),
            row("r3", "old3", "B100"),
            row("r4", "old4", ""),
            row("r5", "old5", "P00012X"),
        ]);

        let out = reconcile_companies(&input, &mappings).expect("reconcile");
        assert_eq!(out.matched.len() + out.missing.len(), input.len());

        let matched: Vec<(&str, &str)> = out
            .matched
            .rows
            .iter()
            .map(|r| (r[0].as_str(), r[3].as_str()))
            .collect();
        assert_eq!(
            matched,
            vec![("r1", "第一インキュ"), ("r3", "本部"), ("r5", "第一インキュ")]
        );

        let missing: Vec<(&str, &str)> = out
            .missing
            .rows
            .iter()
            .map(|r| (r[0].as_str(), r[3].as_str()))
            .collect();
        assert_eq!(missing, vec![("r2", "old2"), ("r4", "old4")]);
        assert_eq!(out.missing.header, input.header);
    }

    #[test]
    fn row_without_project_code_is_missing() {
        let mappings = vec![MappingEntry::new("P", "X")];
        let mut input = table(vec![]);
        input.rows.push(vec!["r".to_string()]);
        let out = reconcile_companies(&input, &mappings).expect("reconcile");
        assert!(out.matched.is_empty());
        assert_eq!(out.missing.rows, vec![vec!["r".to_string()]]);
    }

    #[test]
    fn narrow_target_is_rejected() {
        let narrow = Table::new(vec!["c".to_string(); 6], vec![]);
        let err = reconcile_companies(&narrow, &[]).expect_err("too narrow");
        assert!(err.message.contains("required columns D/G do not exist"));
    }
}

//! Canonical spellings for the company, project code and project name columns.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{StageError, StageOutcome};
use crate::manhour::table::{ColumnPosition, NamedColumn, Table};

/// Header text for the company column drifts between monthly exports.
pub const COMPANY_COLUMN: NamedColumn = NamedColumn::new(&[
    "計上カンパニー名",
    "計上カンパニー",
    "所属カンパニー",
    "所属カンパニー名",
]);

const PROJECT_CODE: ColumnPosition = ColumnPosition::new(6);
const PROJECT_NAME: ColumnPosition = ColumnPosition::new(7);

/// Ordered `(prefix, canonical)` pairs; the first prefix that matches replaces the whole cell.
const COMPANY_PREFIXES: &[(&str, &str)] = &[
    ("本部", "本部"),
    ("事業開発", "事業開発"),
    ("子会社", "子会社"),
    ("投資先", "投資先"),
    ("第１インキュ", "第一インキュ"),
    ("第２インキュ", "第二インキュ"),
    ("第３インキュ", "第三インキュ"),
    ("第４インキュ", "第四インキュ"),
    ("第1インキュ", "第一インキュ"),
    ("第2インキュ", "第二インキュ"),
    ("第3インキュ", "第三インキュ"),
    ("第4インキュ", "第四インキュ"),
];

const PROJECT_NAME_BRACKET: char = '【';

static P_CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(P\d{5})(.*)$").expect("valid P-code regex"));
static LETTER_CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-OQ-Z]\d{3})(.*)$").expect("valid letter-code regex"));
static SPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new("[ \u{3000}]+").expect("valid space regex"));

pub fn normalize_company_name(name: &str) -> String {
    COMPANY_PREFIXES
        .iter()
        .find(|(prefix, _)| name.starts_with(prefix))
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Removes all whitespace, including the ideographic space.
pub fn normalize_project_code(code: &str) -> String {
    code.chars().filter(|c| !c.is_whitespace()).collect()
}

fn join_code_before_bracket(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    let rest = &caps[2];
    rest.starts_with(PROJECT_NAME_BRACKET)
        .then(|| format!("{}_{}", &caps[1], rest))
}

/// Spaces become `_`, and a code glued to a `【` title gets a `_` separator.
pub fn normalize_project_name(name: &str) -> String {
    let spaced = name.replace([' ', '\u{3000}'], "_");
    if P_CODE_PREFIX.is_match(&spaced) {
        return join_code_before_bracket(&P_CODE_PREFIX, &spaced).unwrap_or(spaced);
    }
    join_code_before_bracket(&LETTER_CODE_PREFIX, &spaced).unwrap_or(spaced)
}

/// Project-code rule for the organization table, producing the prefixes used for matching.
pub fn normalize_org_project_code(code: &str) -> String {
    let normalized = normalize_project_name(code);
    SPACE_RUN.replace_all(&normalized, "_").into_owned()
}

pub fn normalize_company_column(table: &Table) -> StageOutcome<Table> {
    let Some(column) = COMPANY_COLUMN.resolve(&table.header) else {
        return Err(StageError::structural(format!(
            "Error: company name column not found. Expected one of {}.",
            COMPANY_COLUMN.candidates.join(", ")
        )));
    };

    let mut out = table.clone();
    for row in &mut out.rows {
        column.map_existing(row, normalize_company_name);
    }
    Ok(out)
}

pub fn normalize_project_columns(table: &Table) -> StageOutcome<Table> {
    StageError::require_columns(table.column_count(), 8, "G-H")?;

    let mut out = table.clone();
    for row in &mut out.rows {
        PROJECT_CODE.map_existing(row, normalize_project_code);
        PROJECT_NAME.map_existing(row, normalize_project_name);
    }
    Ok(out)
}

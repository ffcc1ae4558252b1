//! CSV round-trip of the rule catalogue for admin tooling.
//!
//! Fixed-column layout: `No, action, condition1..condition4, operator,
//! is_goal, visa_type, name`. Condition texts may contain commas, so
//! fields are quoted when needed. Rules with more than four conditions
//! are truncated on export; the importer reports per-row problems and
//! produces a preview, and nothing is saved until the caller applies it.

use crate::loader::RuleRecord;

/// Maximum conditions representable in the fixed-column layout.
pub const MAX_CONDITIONS: usize = 4;

/// Header row of the export format.
pub const CSV_COLUMNS: [&str; 10] = [
    "No",
    "action",
    "condition1",
    "condition2",
    "condition3",
    "condition4",
    "operator",
    "is_goal",
    "visa_type",
    "name",
];

/// Result of parsing an uploaded CSV: the records that parsed plus one
/// message per rejected row.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub records: Vec<RuleRecord>,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Render records as CSV, one row per rule, in catalogue order.
pub fn export_csv(records: &[RuleRecord]) -> String {
    let mut out = String::new();
    write_row(&mut out, CSV_COLUMNS.iter().map(|s| s.to_string()));

    for (idx, record) in records.iter().enumerate() {
        let mut fields: Vec<String> = Vec::with_capacity(CSV_COLUMNS.len());
        fields.push((idx + 1).to_string());
        fields.push(record.action.clone());
        for slot in 0..MAX_CONDITIONS {
            fields.push(record.conditions.get(slot).cloned().unwrap_or_default());
        }
        fields.push(if record.is_or_rule { "OR" } else { "AND" }.to_string());
        fields.push(if record.is_goal_action { "TRUE" } else { "FALSE" }.to_string());
        fields.push(record.visa_type.clone());
        fields.push(record.name.clone().unwrap_or_default());
        write_row(&mut out, fields.into_iter());
    }
    out
}

/// Parse CSV text into rule records. Row numbers in error messages are
/// 1-based file lines (the header is line 1).
pub fn import_csv(text: &str) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    let mut rows = parse_rows(text).into_iter();

    let header = match rows.next() {
        Some(header) => header,
        None => {
            outcome.errors.push("empty document".to_string());
            return outcome;
        }
    };
    let index_of = |name: &str| header.iter().position(|h| h.trim() == name);
    let action_col = index_of("action");
    if action_col.is_none() {
        outcome
            .errors
            .push("missing required column \"action\"".to_string());
        return outcome;
    }
    let condition_cols: Vec<Option<usize>> = (1..=MAX_CONDITIONS)
        .map(|n| index_of(&format!("condition{n}")))
        .collect();
    let operator_col = index_of("operator");
    let is_goal_col = index_of("is_goal");
    let visa_type_col = index_of("visa_type");
    let name_col = index_of("name");

    let field = |row: &[String], col: Option<usize>| -> String {
        col.and_then(|c| row.get(c)).cloned().unwrap_or_default()
    };

    for (line_idx, row) in rows.enumerate() {
        let line_no = line_idx + 2;
        if row.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let action = field(&row, action_col).trim().to_string();
        if action.is_empty() {
            outcome.errors.push(format!("row {line_no}: action is empty"));
            continue;
        }

        let conditions: Vec<String> = condition_cols
            .iter()
            .map(|col| field(&row, *col).trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        if conditions.is_empty() {
            outcome
                .errors
                .push(format!("row {line_no}: no conditions given"));
            continue;
        }

        let operator = field(&row, operator_col).trim().to_uppercase();
        let is_goal = field(&row, is_goal_col).trim().eq_ignore_ascii_case("true");
        let visa_type = field(&row, visa_type_col).trim().to_string();
        let name = field(&row, name_col).trim().to_string();

        outcome.records.push(RuleRecord {
            conditions,
            action,
            is_or_rule: operator == "OR",
            is_goal_action: is_goal,
            visa_type,
            name: (!name.is_empty()).then_some(name),
        });
    }

    outcome
}

// ---------------------------------------------------------------------------
// Minimal CSV plumbing
// ---------------------------------------------------------------------------

fn write_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(&field);
        }
    }
    out.push('\n');
}

/// Split into rows of fields, honouring quoted fields (doubled quotes
/// escape) and both newline conventions.
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                other => field.push(other),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            other => field.push(other),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

pub mod failures;
pub mod output;

pub use failures::{adjust_description, normalize_failures, FailureNormalizer};
pub use output::{normalize_output, OutputNormalizer};

use crate::constants::SENTINEL_TBA;
use crate::types::{CellValue, Table};

/// Trait for the per-report cleaning passes.
///
/// Implementations never fail: malformed cell data degrades to defaults
/// (`"TBA"`, `0`, a missing date) instead of raising.
pub trait TableNormalizer {
    /// Clean `table` and add the derived columns for this report type.
    fn normalize(&self, table: Table) -> Table;

    /// Name used in logs and metric labels.
    fn table_name(&self) -> &'static str;
}

/// Schema pass run before any derivation: trims header names and adds every
/// required column that is missing, filled with its default.
pub fn ensure_columns(table: &mut Table, required: &[(&str, CellValue)]) {
    table.trim_column_names();
    for (name, default) in required {
        table.ensure_column(name, default.clone());
    }
}

/// Text of a cell with surrounding whitespace removed; missing cells give `""`.
pub fn trimmed_text(cell: Option<&CellValue>) -> String {
    cell.map(|c| c.to_text().trim().to_string())
        .unwrap_or_default()
}

/// Trimmed text, with blank collapsing to the `"TBA"` sentinel.
pub fn text_or_tba(cell: Option<&CellValue>) -> CellValue {
    let text = trimmed_text(cell);
    if text.is_empty() {
        CellValue::from(SENTINEL_TBA)
    } else {
        CellValue::Text(text)
    }
}

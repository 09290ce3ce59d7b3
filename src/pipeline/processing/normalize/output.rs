use super::{ensure_columns, trimmed_text, TableNormalizer};
use crate::constants::{COL_BOARD_PASS, COL_DATE, COL_OUTPUT_STATION, COL_STATION, COL_TOTAL};
use crate::pipeline::processing::date_extract::extract_date;
use crate::types::{CellValue, Table};

/// Cleans the output report. The report date comes from the uploaded file name.
#[derive(Debug, Clone)]
pub struct OutputNormalizer {
    pub source_filename: String,
}

impl OutputNormalizer {
    pub fn new(source_filename: impl Into<String>) -> Self {
        Self {
            source_filename: source_filename.into(),
        }
    }
}

impl TableNormalizer for OutputNormalizer {
    fn normalize(&self, table: Table) -> Table {
        normalize_output(table, &self.source_filename)
    }

    fn table_name(&self) -> &'static str {
        "output"
    }
}

/// Normalize an output table.
///
/// `Estacao` is the trimmed station with no `"TBA"` fallback. `Board_Pass`
/// mirrors `Total` after numeric coercion (0 when unreadable); `Total` itself
/// is kept as given. `Data` holds the same value on every row.
pub fn normalize_output(mut table: Table, source_filename: &str) -> Table {
    ensure_columns(
        &mut table,
        &[
            (COL_STATION, CellValue::Empty),
            (COL_TOTAL, CellValue::Number(0.0)),
        ],
    );

    table.derive_column(COL_OUTPUT_STATION, |row| {
        CellValue::Text(trimmed_text(row.get(COL_STATION)))
    });
    table.derive_column(COL_BOARD_PASS, |row| {
        CellValue::Number(
            row.get(COL_TOTAL)
                .and_then(CellValue::to_number)
                .unwrap_or(0.0),
        )
    });

    let report_date = CellValue::from(extract_date(source_filename));
    table.derive_column(COL_DATE, |_| report_date.clone());

    table
}

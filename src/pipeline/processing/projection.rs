use serde_json::{Map, Value};

use crate::constants::{COL_DATE, COL_FAILURE_DATE, FAILURE_COLUMNS, OUTPUT_COLUMNS};
use crate::types::Table;

pub type JsonRow = Map<String, Value>;

/// Which columns of a normalized table are sent to the dashboard.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Allow-list in response order. Absent columns are skipped, never synthesized.
    pub columns: &'static [&'static str],
    /// Columns always emitted as text (or null), whatever the cell type.
    pub text_columns: &'static [&'static str],
}

pub const FAILURE_PROJECTION: Projection = Projection {
    columns: &FAILURE_COLUMNS,
    text_columns: &[COL_FAILURE_DATE],
};

pub const OUTPUT_PROJECTION: Projection = Projection {
    columns: &OUTPUT_COLUMNS,
    text_columns: &[COL_DATE],
};

impl Projection {
    /// Allow-listed columns that exist in `table`.
    pub fn present_columns(&self, table: &Table) -> Vec<&'static str> {
        self.columns
            .iter()
            .copied()
            .filter(|name| table.has_column(name))
            .collect()
    }

    /// Convert every row of `table` into a JSON object.
    pub fn apply(&self, table: &Table) -> Vec<JsonRow> {
        let present = self.present_columns(table);
        table
            .rows()
            .map(|row| {
                present
                    .iter()
                    .map(|name| {
                        let cell = row.get(name);
                        let value = match cell {
                            None => Value::Null,
                            Some(cell) if self.text_columns.contains(name) => cell.to_json_text(),
                            Some(cell) => cell.to_json(),
                        };
                        (name.to_string(), value)
                    })
                    .collect()
            })
            .collect()
    }
}

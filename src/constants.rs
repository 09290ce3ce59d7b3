/// Column and label constants shared by the decoders, normalizers and projection.
/// Column names match the headers of the test-station reports byte for byte.
use std::fmt;

use serde::Serialize;

// Source columns
pub const COL_STATION: &str = "Estação de teste";
pub const COL_DESCRIPTION: &str = "Descrição";
pub const COL_SUB_DESCRIPTION: &str = "Descrição.1";
pub const COL_TOTAL: &str = "Total";

// Derived columns
pub const COL_STATION_ADJUSTED: &str = "Estacao_Ajustada";
pub const COL_DESCRIPTION_ADJUSTED: &str = "Descricao_Ajustada";
pub const COL_OUTPUT_STATION: &str = "Estacao";
pub const COL_BOARD_PASS: &str = "Board_Pass";
pub const COL_DATE: &str = "Data";
pub const COL_FAILURE_DATE: &str = "Data da falha";

/// Placeholder for a blank station or sub-description ("to be assigned").
pub const SENTINEL_TBA: &str = "TBA";

/// Label that replaces the description of no-defect-found and washed boards.
pub const SCREENING_INPUT_BE: &str = "Screening Input BE";

/// Upper-cased markers in `Descrição.1` that trigger the screening label.
pub const SCREENING_MARKERS: [&str; 2] = ["NDF", "PLACA LAVADA"];

/// Columns forwarded for each failure row, in response order.
pub const FAILURE_COLUMNS: [&str; 8] = [
    "Serial",
    "Linha",
    "Work Order",
    COL_STATION_ADJUSTED,
    COL_DESCRIPTION_ADJUSTED,
    COL_SUB_DESCRIPTION,
    "Item",
    COL_FAILURE_DATE,
];

/// Columns forwarded for each output row, in response order.
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "Linha",
    COL_OUTPUT_STATION,
    COL_TOTAL,
    COL_BOARD_PASS,
    "Work Order",
    "Nome do Modelo",
    "Modelo Serial",
    COL_DATE,
];

pub const HEALTH_MESSAGE: &str = "Backend BIP-FALHAS funcionando!";

/// The two uploads a request carries. Display yields the multipart field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Falhas,
    Output,
}

impl ReportKind {
    pub fn field_name(&self) -> &'static str {
        match self {
            ReportKind::Falhas => "falhas",
            ReportKind::Output => "output",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "falhas" => Some(ReportKind::Falhas),
            "output" => Some(ReportKind::Output),
            _ => None,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

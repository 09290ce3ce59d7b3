use super::{ensure_columns, text_or_tba, trimmed_text, TableNormalizer};
use crate::constants::{
    COL_DESCRIPTION, COL_DESCRIPTION_ADJUSTED, COL_STATION, COL_STATION_ADJUSTED,
    COL_SUB_DESCRIPTION, SCREENING_INPUT_BE, SCREENING_MARKERS,
};
use crate::types::{CellValue, Row, Table};

/// Cleans the failures report.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailureNormalizer;

impl TableNormalizer for FailureNormalizer {
    fn normalize(&self, table: Table) -> Table {
        normalize_failures(table)
    }

    fn table_name(&self) -> &'static str {
        "falhas"
    }
}

/// Normalize a failures table.
///
/// Adds `Estacao_Ajustada` and `Descricao_Ajustada`, and rewrites
/// `Descrição.1` in place so it is never blank. Order matters: the
/// description rule reads the already-normalized `Descrição.1`.
pub fn normalize_failures(mut table: Table) -> Table {
    ensure_columns(
        &mut table,
        &[
            (COL_STATION, CellValue::Empty),
            (COL_DESCRIPTION, CellValue::Empty),
            (COL_SUB_DESCRIPTION, CellValue::Empty),
        ],
    );

    table.derive_column(COL_STATION_ADJUSTED, |row| text_or_tba(row.get(COL_STATION)));
    table.derive_column(COL_SUB_DESCRIPTION, |row| {
        text_or_tba(row.get(COL_SUB_DESCRIPTION))
    });
    table.derive_column(COL_DESCRIPTION_ADJUSTED, adjust_description);

    table
}

/// Description shown on the dashboard for one failure row.
///
/// No-defect-found and washed boards are grouped under "Screening Input BE";
/// every other row keeps its original `Descrição`, blank included.
pub fn adjust_description(row: Row<'_>) -> CellValue {
    let sub_description = trimmed_text(row.get(COL_SUB_DESCRIPTION)).to_uppercase();
    if SCREENING_MARKERS
        .iter()
        .any(|marker| sub_description.contains(marker))
    {
        return CellValue::from(SCREENING_INPUT_BE);
    }
    row.get(COL_DESCRIPTION).cloned().unwrap_or(CellValue::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> Table {
        Table::from_rows(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    fn text(s: &str) -> CellValue {
        CellValue::from(s)
    }

    #[test]
    fn test_blank_station_becomes_tba() {
        let input = table(
            &["Estação de teste", "Descrição", "Descrição.1"],
            vec![
                vec![text(""), text("a"), text("x")],
                vec![CellValue::Empty, text("b"), text("y")],
                vec![text("   "), text("c"), text("z")],
                vec![text(" FCT 02 "), text("d"), text("w")],
            ],
        );
        let out = normalize_failures(input);
        let stations: Vec<String> = out
            .column_values("Estacao_Ajustada")
            .iter()
            .map(|c| c.to_text())
            .collect();
        assert_eq!(stations, vec!["TBA", "TBA", "TBA", "FCT 02"]);
        // source column is left untouched
        assert_eq!(out.get(3, "Estação de teste"), Some(&text(" FCT 02 ")));
    }

    #[test]
    fn test_blank_sub_description_becomes_tba() {
        let input = table(
            &["Descrição.1"],
            vec![
                vec![CellValue::Empty],
                vec![text("  ")],
                vec![text("  Curto  ")],
            ],
        );
        let out = normalize_failures(input);
        assert_eq!(out.get(0, "Descrição.1"), Some(&text("TBA")));
        assert_eq!(out.get(1, "Descrição.1"), Some(&text("TBA")));
        assert_eq!(out.get(2, "Descrição.1"), Some(&text("Curto")));
    }

    #[test]
    fn test_screening_rule_is_case_insensitive() {
        let input = table(
            &["Descrição", "Descrição.1"],
            vec![
                vec![text("Cold Solder"), text("placa lavada")],
                vec![text("Short"), text("ndf - retest ok")],
                vec![text("Open"), text("Componente ausente")],
                vec![CellValue::Empty, text("Trocado")],
            ],
        );
        let out = normalize_failures(input);
        assert_eq!(out.get(0, "Descricao_Ajustada"), Some(&text("Screening Input BE")));
        assert_eq!(out.get(1, "Descricao_Ajustada"), Some(&text("Screening Input BE")));
        assert_eq!(out.get(2, "Descricao_Ajustada"), Some(&text("Open")));
        assert_eq!(out.get(3, "Descricao_Ajustada"), Some(&CellValue::Empty));
        // stored casing is kept
        assert_eq!(out.get(0, "Descrição.1"), Some(&text("placa lavada")));
    }

    #[test]
    fn test_original_description_type_is_preserved() {
        let input = table(
            &["Descrição", "Descrição.1"],
            vec![vec![CellValue::Number(42.0), text("Outro")]],
        );
        let out = normalize_failures(input);
        assert_eq!(out.get(0, "Descricao_Ajustada"), Some(&CellValue::Number(42.0)));
    }

    #[test]
    fn test_missing_columns_are_created() {
        let input = table(&["Serial"], vec![vec![text("SN1")]]);
        let out = normalize_failures(input);
        for column in [
            "Estação de teste",
            "Descrição",
            "Descrição.1",
            "Estacao_Ajustada",
            "Descricao_Ajustada",
        ] {
            assert!(out.has_column(column), "missing {column}");
        }
        assert_eq!(out.get(0, "Estacao_Ajustada"), Some(&text("TBA")));
        assert_eq!(out.get(0, "Descrição.1"), Some(&text("TBA")));
        assert_eq!(out.get(0, "Descricao_Ajustada"), Some(&CellValue::Empty));
        assert_eq!(out.get(0, "Serial"), Some(&text("SN1")));
    }

    #[test]
    fn test_zero_rows() {
        let out = normalize_failures(Table::default());
        assert!(out.is_empty());
        assert!(out.has_column("Estacao_Ajustada"));
        assert!(out.has_column("Descricao_Ajustada"));
    }

    #[test]
    fn test_untrimmed_headers_are_matched() {
        let input = table(
            &[" Estação de teste ", "Descrição", "Descrição.1  "],
            vec![vec![text("ICT"), text("Curto"), text("NDF")]],
        );
        let out = normalize_failures(input);
        assert_eq!(out.get(0, "Estacao_Ajustada"), Some(&text("ICT")));
        assert_eq!(out.get(0, "Descricao_Ajustada"), Some(&text("Screening Input BE")));
    }

    #[test]
    fn test_idempotent() {
        let input = table(
            &["Serial", "Estação de teste", "Descrição", "Descrição.1"],
            vec![
                vec![text("SN1"), text(""), text("Cold Solder"), text("placa lavada")],
                vec![text("SN2"), text("AOI"), CellValue::Empty, CellValue::Empty],
            ],
        );
        let once = normalize_failures(input);
        let twice = normalize_failures(once.clone());
        assert_eq!(once, twice);
    }
}

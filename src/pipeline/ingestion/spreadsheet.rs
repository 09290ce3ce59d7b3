//! Decoding of uploaded report files into [`Table`]s.
//!
//! Both reports carry a title banner on the first sheet row and the column
//! headers on the second; everything below the header is data. Workbooks
//! (xlsx, xlsm, xlsb, xls, ods) are detected from their content, and files
//! whose name ends in `.csv` are read as delimited text.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::constants::ReportKind;
use crate::error::{ReportError, Result};
use crate::types::{CellValue, Table};

/// Zero-based sheet row holding the column headers.
const HEADER_ROW: usize = 1;

/// Cell texts read as missing values, the same set spreadsheet tooling
/// treats as "not available" by default.
const NA_VALUES: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// One uploaded report as received from the client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub kind: ReportKind,
    /// Name declared by the client; the output report's date is read from it.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(kind: ReportKind, filename: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            kind,
            filename,
            bytes,
        }
    }

    pub fn filename_or_empty(&self) -> &str {
        self.filename.as_deref().unwrap_or("")
    }

    fn is_csv(&self) -> bool {
        self.filename
            .as_deref()
            .map(|name| name.to_ascii_lowercase().ends_with(".csv"))
            .unwrap_or(false)
    }
}

/// Decode an upload into a table. Unreadable bytes are reported against the
/// file's [`ReportKind`]; an empty result is not an error at this stage.
pub fn decode_upload(upload: &UploadedFile) -> Result<Table> {
    let table = if upload.is_csv() {
        decode_csv(&upload.bytes).map_err(|e| ReportError::decode(upload.kind, e))?
    } else {
        decode_workbook(&upload.bytes).map_err(|e| ReportError::decode(upload.kind, e))?
    };
    debug!(
        file = %upload.kind,
        columns = table.columns().len(),
        rows = table.len(),
        "decoded upload"
    );
    Ok(table)
}

/// Read the first worksheet of a workbook held in memory.
pub fn decode_workbook(bytes: &[u8]) -> std::result::Result<Table, String> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).map_err(|e| e.to_string())?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| "workbook has no worksheets".to_string())?
        .map_err(|e| e.to_string())?;
    Ok(table_from_range(&range))
}

/// Build a table from a worksheet range, honouring the banner/header layout.
pub fn table_from_range(range: &Range<Data>) -> Table {
    if range.is_empty() {
        return Table::default();
    }
    // Ranges start at the first used cell, so offsets are relative to it.
    let start_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut header: Option<Vec<String>> = None;
    let mut data = Vec::new();

    for (offset, row) in range.rows().enumerate() {
        let absolute = start_row + offset;
        if absolute < HEADER_ROW {
            continue;
        }
        if absolute == HEADER_ROW {
            header = Some(row.iter().map(header_text).collect());
            continue;
        }
        data.push(row.iter().map(cell_from_data).collect::<Vec<_>>());
    }

    // A blank header row still yields positional column names.
    let header = header.unwrap_or_else(|| vec![String::new(); range.width()]);
    build_table(header, data)
}

/// Read delimited text. The delimiter (`,` or `;`) is taken from the header line.
pub fn decode_csv(bytes: &[u8]) -> std::result::Result<Table, String> {
    let text = decode_text(bytes);
    let delimiter = sniff_delimiter(text.as_bytes());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut data = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| e.to_string())?;
        if idx < HEADER_ROW {
            continue;
        }
        if idx == HEADER_ROW {
            header = Some(record.iter().map(str::to_string).collect());
            continue;
        }
        data.push(record.iter().map(cell_from_text).collect::<Vec<_>>());
    }

    match header {
        Some(header) => Ok(build_table(header, data)),
        None => Ok(Table::default()),
    }
}

/// UTF-8 text (BOM stripped) as-is; anything else is read as Windows-1252,
/// the encoding spreadsheet tools use for CSV exports in pt-BR locales.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            debug!("csv upload is not UTF-8, read as Windows-1252");
            text
        }
    }
}

fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let head: Vec<&[u8]> = bytes.split(|b| *b == b'\n').take(HEADER_ROW + 1).collect();
    let count = |needle: u8| -> usize {
        head.iter()
            .map(|line| line.iter().filter(|b| **b == needle).count())
            .sum()
    };
    if count(b';') > count(b',') {
        b';'
    } else {
        b','
    }
}

fn build_table(header: Vec<String>, data: Vec<Vec<CellValue>>) -> Table {
    let mut table = Table::new(dedupe_headers(header));
    for row in data {
        // blank lines do not count as data
        if row.iter().all(CellValue::is_missing) {
            continue;
        }
        table.push_row(row);
    }
    table
}

/// Name blank headers by position and disambiguate repeats left to right
/// with `.1`, `.2`, … suffixes (a second `Descrição` becomes `Descrição.1`).
pub fn dedupe_headers(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut name = if name.is_empty() {
                format!("Unnamed: {}", idx)
            } else {
                name
            };
            let mut seen = counts.get(&name).copied().unwrap_or(0);
            while seen > 0 {
                counts.insert(name.clone(), seen + 1);
                name = format!("{}.{}", name, seen);
                seen = counts.get(&name).copied().unwrap_or(0);
            }
            counts.insert(name.clone(), seen + 1);
            name
        })
        .collect()
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_from_data(other).to_text(),
    }
}

fn cell_from_text(text: &str) -> CellValue {
    if NA_VALUES.contains(&text) {
        return CellValue::Empty;
    }
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(text.to_string()),
    }
}

/// Map a calamine cell onto our cell model.
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => {
            if NA_VALUES.contains(&s.as_str()) {
                CellValue::Empty
            } else {
                CellValue::Text(s.clone())
            }
        }
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => parse_iso(s).unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso(s: &str) -> Option<CellValue> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(CellValue::DateTime(dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .map(CellValue::Date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn range_from(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_banner_row_is_skipped_and_second_row_is_header() {
        let range = range_from(&[
            &[s("Relatório de falhas - Linha 3"), Data::Empty, Data::Empty],
            &[s("Serial"), s("Estação de teste"), s("Total")],
            &[s("SN1"), s("ICT"), Data::Float(12.0)],
            &[s("SN2"), Data::Empty, Data::Int(3)],
        ]);
        let table = table_from_range(&range);
        assert_eq!(table.columns(), &["Serial", "Estação de teste", "Total"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Total"), Some(&CellValue::Number(12.0)));
        assert_eq!(table.get(1, "Estação de teste"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_duplicate_description_header() {
        let range = range_from(&[
            &[s("Falhas")],
            &[s("Serial"), s("Descrição"), s("Descrição")],
            &[s("SN1"), s("Cold Solder"), s("placa lavada")],
        ]);
        let table = table_from_range(&range);
        assert_eq!(table.columns(), &["Serial", "Descrição", "Descrição.1"]);
        assert_eq!(table.get(0, "Descrição.1"), Some(&CellValue::from("placa lavada")));
    }

    #[test]
    fn test_blank_rows_and_error_cells() {
        let range = range_from(&[
            &[s("Output")],
            &[s("Linha"), s("Total")],
            &[Data::Empty, Data::Empty],
            &[s("L1"), Data::Error(calamine::CellErrorType::NA)],
            &[s(""), s("NA")],
        ]);
        let table = table_from_range(&range);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(0, "Total"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_banner_only_sheet_is_empty() {
        let range = range_from(&[&[s("Somente título")]]);
        let table = table_from_range(&range);
        assert!(table.is_empty());
    }

    #[test]
    fn test_dedupe_headers() {
        let names = vec!["a", "a", "", "a.1", "a"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            dedupe_headers(names),
            vec!["a", "a.1", "Unnamed: 2", "a.1.1", "a.2"]
        );
    }

    fn datetime(serial: f64, is_1904: bool) -> Data {
        Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, is_1904))
    }

    #[test]
    fn test_excel_serial_dates_1900_system() {
        assert_eq!(
            cell_from_data(&datetime(45982.5, false)).to_text(),
            "2025-11-21 12:00:00"
        );
    }

    #[test]
    fn test_excel_serial_dates_1904_system() {
        assert_eq!(
            cell_from_data(&datetime(45982.5, true)).to_text(),
            "2029-11-22 12:00:00"
        );
        assert_eq!(
            cell_from_data(&datetime(44520.5, true)).to_text(),
            "2025-11-21 12:00:00"
        );
    }

    #[test]
    fn test_duration_cell_stays_numeric() {
        let cell = Data::DateTime(ExcelDateTime::new(1.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_from_data(&cell), CellValue::Number(1.5));
    }

    #[test]
    fn test_iso_datetime_cell() {
        let cell = cell_from_data(&Data::DateTimeIso("2025-11-21T14:30:00".to_string()));
        assert_eq!(cell.to_text(), "2025-11-21 14:30:00");
    }

    #[test]
    fn test_csv_semicolon() {
        let csv = "Relatório\nLinha;Total;Estação de teste\nL1;12;ICT\n;;\nL2;abc;\n";
        let table = decode_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Linha", "Total", "Estação de teste"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(0, "Total"), Some(&CellValue::Number(12.0)));
        assert_eq!(table.get(1, "Total"), Some(&CellValue::from("abc")));
        assert_eq!(table.get(1, "Estação de teste"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_with_bom_and_comma() {
        let csv = "\u{feff}Titulo,,\nSerial,Descrição,Descrição\nSN1,Curto,NDF\n";
        let table = decode_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["Serial", "Descrição", "Descrição.1"]);
        assert_eq!(table.get(0, "Descrição.1"), Some(&CellValue::from("NDF")));
    }

    #[test]
    fn test_csv_windows_1252_headers() {
        let csv: &[u8] = b"Relatorio\nSerial;Esta\xe7\xe3o de teste;Descri\xe7\xe3o;Descri\xe7\xe3o\nSN1;ICT;Curto;Trocado\n";
        let table = decode_csv(csv).unwrap();
        assert_eq!(
            table.columns(),
            &["Serial", "Estação de teste", "Descrição", "Descrição.1"]
        );
        assert_eq!(table.get(0, "Estação de teste"), Some(&CellValue::from("ICT")));
        assert_eq!(table.get(0, "Descrição.1"), Some(&CellValue::from("Trocado")));
    }

    #[test]
    fn test_garbage_bytes_name_the_file() {
        let upload = UploadedFile::new(
            ReportKind::Falhas,
            Some("falhas.xlsx".to_string()),
            b"definitely not a workbook".to_vec(),
        );
        let err = decode_upload(&upload).unwrap_err();
        match err {
            ReportError::Decode { file, .. } => assert_eq!(file, ReportKind::Falhas),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

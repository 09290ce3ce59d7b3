use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::ReportKind;
use crate::error::{ReportError, Result};
use crate::observability::metrics;
use crate::pipeline::ingestion::{decode_upload, UploadedFile};
use crate::pipeline::processing::normalize::{FailureNormalizer, OutputNormalizer, TableNormalizer};
use crate::pipeline::processing::projection::{JsonRow, FAILURE_PROJECTION, OUTPUT_PROJECTION};
use crate::types::Table;

/// Response body of a successful `/processar` call.
#[derive(Debug, Serialize)]
pub struct ProcessResult {
    pub sucesso: bool,
    pub falhas_rows: Vec<JsonRow>,
    pub output_rows: Vec<JsonRow>,
    pub total_falhas: usize,
    pub total_output: usize,
}

impl ProcessResult {
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Normalize both decoded reports and project them for the dashboard.
pub fn process_tables(falhas: Table, output: Table, output_filename: &str) -> ProcessResult {
    let failure_normalizer = FailureNormalizer;
    let output_normalizer = OutputNormalizer::new(output_filename);

    let falhas = failure_normalizer.normalize(falhas);
    debug!(columns = ?falhas.columns(), "normalized failures table");
    metrics::normalize::rows_normalized(failure_normalizer.table_name(), falhas.len());

    let output = output_normalizer.normalize(output);
    debug!(columns = ?output.columns(), "normalized output table");
    metrics::normalize::rows_normalized(output_normalizer.table_name(), output.len());

    let falhas_rows = FAILURE_PROJECTION.apply(&falhas);
    let output_rows = OUTPUT_PROJECTION.apply(&output);

    ProcessResult {
        sucesso: true,
        total_falhas: falhas_rows.len(),
        total_output: output_rows.len(),
        falhas_rows,
        output_rows,
    }
}

/// Decode, validate and process the two uploaded reports.
///
/// Checks run in order: both files present, failures decodes, output
/// decodes, failures has rows, output has rows.
pub fn process_uploads(
    falhas: Option<UploadedFile>,
    output: Option<UploadedFile>,
) -> Result<ProcessResult> {
    let (falhas, output) = match (falhas, output) {
        (Some(falhas), Some(output)) => (falhas, output),
        _ => return Err(ReportError::MissingInput),
    };

    let started = Instant::now();
    let falhas_table = decode_checked(&falhas)?;
    let output_table = decode_checked(&output)?;

    for (kind, table) in [
        (ReportKind::Falhas, &falhas_table),
        (ReportKind::Output, &output_table),
    ] {
        if table.is_empty() {
            warn!(file = %kind, "uploaded report has no data rows");
            return Err(ReportError::EmptyTable { file: kind });
        }
    }

    let result = process_tables(falhas_table, output_table, output.filename_or_empty());
    metrics::requests::duration(started.elapsed().as_secs_f64());
    info!(
        total_falhas = result.total_falhas,
        total_output = result.total_output,
        source_filename = output.filename_or_empty(),
        "processed reports"
    );
    Ok(result)
}

fn decode_checked(upload: &UploadedFile) -> Result<Table> {
    decode_upload(upload).map_err(|e| {
        warn!(file = %upload.kind, error = %e, "failed to decode upload");
        metrics::decode::error(upload.kind);
        e
    })
}

/// Process two reports from disk. The output report's date comes from its file name.
pub fn process_files(falhas: &Path, output: &Path) -> Result<ProcessResult> {
    let falhas = read_upload(ReportKind::Falhas, falhas)?;
    let output = read_upload(ReportKind::Output, output)?;
    process_uploads(Some(falhas), Some(output))
}

fn read_upload(kind: ReportKind, path: &Path) -> Result<UploadedFile> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    Ok(UploadedFile::new(kind, filename, bytes))
}

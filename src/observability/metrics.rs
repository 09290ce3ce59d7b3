//! Metrics for the report pipeline.
//!
//! Recording goes through the `metrics` facade, so every call is a no-op until
//! [`init`] installs the Prometheus recorder. `/metrics` renders the handle.

use std::fmt;
use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::error::{ReportError, Result};

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    RequestsProcessed,
    RequestsRejected,
    RequestDuration,
    RowsNormalized,
    DecodeErrors,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::RequestsProcessed => "bip_requests_processed_total",
            MetricName::RequestsRejected => "bip_requests_rejected_total",
            MetricName::RequestDuration => "bip_request_duration_seconds",
            MetricName::RowsNormalized => "bip_rows_normalized_total",
            MetricName::DecodeErrors => "bip_decode_errors_total",
        }
    }

    pub fn all_metrics() -> impl Iterator<Item = MetricName> {
        use MetricName::*;
        [
            RequestsProcessed,
            RequestsRejected,
            RequestDuration,
            RowsNormalized,
            DecodeErrors,
        ]
        .into_iter()
    }

    /// Human-readable description, registered with the recorder at startup.
    pub fn description(&self) -> &'static str {
        match self {
            MetricName::RequestsProcessed => "Report pairs processed successfully",
            MetricName::RequestsRejected => "Requests rejected, by reason",
            MetricName::RequestDuration => "Decode and normalize duration",
            MetricName::RowsNormalized => "Rows normalized, by table",
            MetricName::DecodeErrors => "Uploads that could not be decoded, by file",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Calling it twice is harmless.
pub fn init() -> Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ReportError::Config(format!("Failed to install Prometheus recorder: {}", e)))?;
    METRICS_HANDLE.set(handle).ok();

    for name in MetricName::all_metrics() {
        if name == MetricName::RequestDuration {
            ::metrics::describe_histogram!(name.as_str(), name.description());
        } else {
            ::metrics::describe_counter!(name.as_str(), name.description());
        }
    }
    info!("Metrics system initialized");
    Ok(())
}

/// Prometheus text exposition, or `None` when no recorder is installed.
pub fn render() -> Option<String> {
    METRICS_HANDLE.get().map(|handle| handle.render())
}

pub mod requests {
    use super::MetricName;

    pub fn processed() {
        ::metrics::counter!(MetricName::RequestsProcessed.as_str()).increment(1);
    }

    pub fn rejected(reason: &'static str) {
        ::metrics::counter!(MetricName::RequestsRejected.as_str(), "reason" => reason).increment(1);
    }

    pub fn duration(secs: f64) {
        ::metrics::histogram!(MetricName::RequestDuration.as_str()).record(secs);
    }
}

pub mod normalize {
    use super::MetricName;

    pub fn rows_normalized(table: &'static str, rows: usize) {
        ::metrics::counter!(MetricName::RowsNormalized.as_str(), "table" => table)
            .increment(rows as u64);
    }
}

pub mod decode {
    use super::MetricName;
    use crate::constants::ReportKind;

    pub fn error(file: ReportKind) {
        ::metrics::counter!(MetricName::DecodeErrors.as_str(), "file" => file.field_name())
            .increment(1);
    }
}

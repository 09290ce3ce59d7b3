pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod server;
pub mod types;

pub use error::{ReportError, Result};
pub use pipeline::processing::{extract_date, normalize_failures, normalize_output};
pub use types::{CellValue, Table};

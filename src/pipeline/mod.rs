// Report pipeline: ingestion (decoding uploads) and processing (normalize + project)

pub mod ingestion;
pub mod processing;
pub mod tasks;

pub use tasks::{process_files, process_tables, process_uploads, ProcessResult};

// Pipeline ingestion: turning uploaded report bytes into tables

pub mod spreadsheet;

pub use spreadsheet::{decode_upload, UploadedFile};

// Pipeline processing: normalization, date extraction, and projection

pub mod date_extract;
pub mod normalize;
pub mod projection;

pub use date_extract::extract_date;
pub use normalize::{normalize_failures, normalize_output};

// Observability: metrics recording and exposition

pub mod metrics;

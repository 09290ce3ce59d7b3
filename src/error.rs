use thiserror::Error;

use crate::constants::ReportKind;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Ambos os arquivos (falhas e output) são obrigatórios")]
    MissingInput,

    #[error("Erro ao processar arquivo de {file}: {message}")]
    Decode { file: ReportKind, message: String },

    #[error("Arquivo de {file} está vazio")]
    EmptyTable { file: ReportKind },

    #[error("Erro ao processar arquivos: {message}")]
    Unhandled { message: String, details: String },

    #[error("Erro ao ler upload: {0}")]
    Upload(String),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Server(#[from] hyper::Error),
}

impl ReportError {
    pub fn decode(file: ReportKind, err: impl std::fmt::Display) -> Self {
        ReportError::Decode {
            file,
            message: err.to_string(),
        }
    }

    /// Whether the caller sent something unusable, as opposed to a failure on our side.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingInput
                | ReportError::Decode { .. }
                | ReportError::EmptyTable { .. }
                | ReportError::Upload(_)
        )
    }

    /// Short label used for metrics and log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            ReportError::MissingInput => "missing_input",
            ReportError::Decode { .. } => "decode",
            ReportError::EmptyTable { .. } => "empty_table",
            ReportError::Unhandled { .. } => "unhandled",
            ReportError::Upload(_) => "upload",
            ReportError::Json(_) => "json",
            ReportError::Toml(_) => "toml",
            ReportError::Io(_) => "io",
            ReportError::Config(_) => "config",
            ReportError::Server(_) => "server",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

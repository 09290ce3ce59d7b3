use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use hyper::Server;
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::constants::{ReportKind, HEALTH_MESSAGE};
use crate::error::{ReportError, Result};
use crate::observability::metrics;
use crate::pipeline::ingestion::UploadedFile;
use crate::pipeline::tasks::{process_uploads, ProcessResult};

/// Static acknowledgment used by the dashboard to check the backend is up
async fn root() -> impl IntoResponse {
    Json(json!({ "mensagem": HEALTH_MESSAGE }))
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "bip-falhas",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Prometheus exposition; 404 when the recorder was never installed
async fn metrics_endpoint() -> Response {
    match metrics::render() {
        Some(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /processar: multipart form with `falhas` and `output` file parts
async fn processar(multipart: std::result::Result<Multipart, MultipartRejection>) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("processar", %request_id);
    async move {
        match handle_processar(multipart).await {
            Ok(result) => {
                metrics::requests::processed();
                Json(result).into_response()
            }
            Err(e) => {
                metrics::requests::rejected(e.reason());
                e.into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle_processar(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ProcessResult> {
    let multipart = multipart.map_err(|e| ReportError::Upload(e.to_string()))?;
    let (falhas, output) = read_uploads(multipart).await?;

    // Decoding and normalization are CPU-bound; keep them off the async workers.
    tokio::task::spawn_blocking(move || process_uploads(falhas, output))
        .await
        .map_err(|e| ReportError::Unhandled {
            message: e.to_string(),
            details: format!("{:?}", e),
        })?
}

/// Collect the two file parts. Unknown fields are skipped; a part without
/// content counts as not supplied.
async fn read_uploads(
    mut multipart: Multipart,
) -> Result<(Option<UploadedFile>, Option<UploadedFile>)> {
    let mut falhas = None;
    let mut output = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ReportError::Upload(e.to_string()))?
    {
        let Some(kind) = field.name().and_then(ReportKind::from_field_name) else {
            continue;
        };
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ReportError::Upload(e.to_string()))?;
        if bytes.is_empty() {
            continue;
        }
        info!(file = %kind, filename = ?filename, bytes = bytes.len(), "received upload");

        let upload = UploadedFile::new(kind, filename, bytes.to_vec());
        match kind {
            ReportKind::Falhas => falhas = Some(upload),
            ReportKind::Output => output = Some(upload),
        }
    }

    Ok((falhas, output))
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!(reason = self.reason(), error = %self, "rejected request");
            return (StatusCode::BAD_REQUEST, Json(json!({ "erro": self.to_string() })))
                .into_response();
        }

        let details = match &self {
            ReportError::Unhandled { details, .. } => details.clone(),
            other => format!("{:?}", other),
        };
        error!(error = %self, details = %details, "unhandled error while processing reports");
        let erro = match &self {
            ReportError::Unhandled { .. } => self.to_string(),
            other => format!("Erro ao processar arquivos: {}", other),
        };
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "erro": erro, "detalhes": details })),
        )
            .into_response()
    }
}

/// Create the HTTP router with all routes
pub fn create_server(config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/processar", post(processar))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(ServiceBuilder::new().layer(cors))
}

/// Start the HTTP server and run until Ctrl-C
pub async fn start_server(config: &ServerConfig) -> Result<()> {
    let app = create_server(config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            ReportError::Config(format!(
                "Invalid listen address {}:{}: {}",
                config.host, config.port, e
            ))
        })?;

    info!(%addr, "HTTP server listening");
    info!("Health check: http://{}/health", addr);

    Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

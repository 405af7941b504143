//! HTTP surface: `POST /upload` and `GET /health`.

use crate::utils::upload_store::{validate_file_name, UploadStore, UploadedFile};
use crate::{extract_placemarks, ExtractionReport, KmlError, ServerConfig, UploadError};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Multipart field that must carry the KML file.
pub const UPLOAD_FIELD: &str = "file";

/// State shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UploadStore>,
    pub retain_uploads: bool,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            store: Arc::new(UploadStore::new(config.upload_dir.clone())),
            retain_uploads: config.retain_uploads,
        }
    }
}

/// Everything `/upload` can fail with. Rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Kml(#[from] KmlError),

    #[error("{}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) | ApiError::Kml(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("Upload rejected ({}): {:?}", status, self);
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Accept one `.kml` file in the `file` field and summarize its placemarks.
pub async fn upload_kml(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionReport>, ApiError> {
    // A body that is not multipart at all carries no file.
    let Ok(mut multipart) = multipart else {
        return Err(UploadError::MissingFile.into());
    };

    let mut pending = None;

    while let Some(field) = multipart.next_field().await? {
        // Plain form fields and empty file inputs carry no file name and are ignored.
        let Some(file_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        let field_name = field.name().unwrap_or_default().to_owned();
        if field_name != UPLOAD_FIELD || pending.is_some() {
            return Err(UploadError::UnexpectedField { field: field_name }.into());
        }

        validate_file_name(&file_name)?;
        let content = field.bytes().await?;
        pending = Some((file_name, content));
    }

    let (file_name, content) = pending.ok_or(UploadError::MissingFile)?;
    let file = state.store.store(&file_name, &content).await?;
    info!(
        "Uploaded file: {} -> {} ({} bytes, sha256 {}, received {})",
        file.original_name,
        file.storage_path.display(),
        file.size,
        file.sha256,
        file.received_at.to_rfc3339()
    );

    let outcome = summarize_upload(&state.store, &file).await;
    if !state.retain_uploads {
        state.store.discard(&file).await;
    }

    let report = outcome?;
    info!(
        "Summarized {}: {} placemarks, {} details",
        file.original_name,
        report.total_placemarks(),
        report.details.len()
    );
    Ok(Json(report))
}

async fn summarize_upload(store: &UploadStore, file: &UploadedFile) -> Result<ExtractionReport, ApiError> {
    let text = store.read_text(file).await?;
    let report = tokio::task::spawn_blocking(move || extract_placemarks(&text)).await??;
    Ok(report)
}

fn cors_layer(config: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid allowed origin {}: {}", config.allowed_origin, e))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Build the API router
pub fn build_router(config: &ServerConfig) -> anyhow::Result<Router> {
    let state = AppState::new(config);

    Ok(Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload_kml))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config)?)
        .with_state(state))
}

/// Serve on an already bound listener until the future is dropped.
pub async fn serve(listener: TcpListener, config: ServerConfig) -> anyhow::Result<()> {
    let app = build_router(&config)?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Bind `config.addr` and serve until Ctrl-C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        "Starting KML upload server on {} (uploads in {})",
        config.addr,
        config.upload_dir.display()
    );

    let app = build_router(&config)?;
    let listener = TcpListener::bind(config.addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

// Axum request handlers — translate HTTP requests into engine operations.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};

use crate::config::DEFAULT_LIMIT;
use crate::engine::packaging::Packager;
use crate::engine::purge::purge;
use crate::engine::session::{is_safe_filename, SessionStore};
use crate::engine::staging::StagingManager;
use crate::error::Error;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub staging: Arc<StagingManager>,
    pub packager: Arc<Packager>,
}

pub struct AppServer {
    port: u16,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl AppServer {
    /// Bind `addr` and serve the app in a background task, returning a handle.
    pub async fn bind(addr: &str, state: AppState) -> crate::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = router(state);
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shutdown the server gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/generate", post(generate_handler))
        .route("/image/{session_id}/{filename}", get(image_handler))
        .route("/download-selected", post(download_selected_handler))
        .route("/download-zip/{filename}", get(download_zip_handler))
        .route("/cleanup", post(cleanup_handler))
        .with_state(state)
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::InvalidSession(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Io(_) | Error::Upstream(_) | Error::Archive(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Every handler's failure boundary: typed errors become a status code plus
/// the `{success:false, message}` body the frontend expects.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {}", self);
        } else {
            warn!("request rejected: {}", self);
        }
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    query: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    success: bool,
    message: String,
    session_id: String,
    images: Vec<crate::engine::session::ImageEntry>,
}

#[derive(Debug, Deserialize)]
struct DownloadSelectedRequest {
    #[serde(default)]
    session_id: String,
    #[serde(default)]
    images: Vec<String>,
}

/// GET / — landing page.
async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// POST /generate — download images for a query and stage them in a new session.
async fn generate_handler(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, Error> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(Error::validation("Please provide a search query"));
    }
    let limit = req.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err(Error::validation("limit must be at least 1"));
    }

    let session = Arc::new(state.staging.stage(query, limit).await?);
    state.store.put(session.clone());

    Ok(Json(GenerateResponse {
        success: true,
        message: format!("Successfully generated {} images", session.images.len()),
        session_id: session.id.clone(),
        images: session.images.clone(),
    }))
}

/// GET /image/{session_id}/{filename} — serve one staged image.
async fn image_handler(
    State(state): State<AppState>,
    Path((session_id, filename)): Path<(String, String)>,
) -> Result<Response, Error> {
    if !is_safe_filename(&filename) {
        return Err(Error::not_found("File not found"));
    }
    let session = state
        .store
        .get(&session_id)
        .ok_or_else(|| Error::not_found("File not found"))?;

    let path = session.staging_path.join(&filename);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| Error::not_found("File not found"))?;
    debug!("serving image session={} file={}", session_id, filename);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        content_type_for(&filename)
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// POST /download-selected — bundle the selected images into an archive.
async fn download_selected_handler(
    State(state): State<AppState>,
    Json(req): Json<DownloadSelectedRequest>,
) -> Result<Json<serde_json::Value>, Error> {
    if req.session_id.is_empty() {
        return Err(Error::validation("Session ID is missing"));
    }
    let session = state
        .store
        .get(&req.session_id)
        .ok_or_else(|| Error::invalid_session(format!("session {} not found", req.session_id)))?;

    let result = state.packager.package(&session, &req.images)?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully created zip with {} images", result.included),
        "zip_file": result.zip_file,
    })))
}

/// GET /download-zip/{filename} — serve a completed archive as an attachment.
async fn download_zip_handler(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, Error> {
    if !is_safe_filename(&filename) {
        return Err(Error::not_found("File not found"));
    }
    let path = state.packager.output_dir().join(&filename);
    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|_| Error::not_found("File not found"))?;
    debug!("serving archive {}", filename);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        header::HeaderValue::from_static("application/zip"),
    );
    if let Ok(disposition) =
        format!("attachment; filename=\"{}\"", filename).parse::<header::HeaderValue>()
    {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }
    let body = Body::from_stream(ReaderStream::new(file));
    Ok((StatusCode::OK, headers, body).into_response())
}

/// POST /cleanup — purge all archives, staging directories, and sessions.
async fn cleanup_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, Error> {
    let report = purge(
        state.packager.output_dir(),
        state.staging.root(),
        &state.store,
    )?;
    debug!(
        "cleanup removed {} archive(s) and {} staging dir(s)",
        report.archives_removed, report.staging_dirs_removed
    );
    Ok(Json(json!({
        "success": true,
        "message": "Cleanup completed",
    })))
}

fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit('.')
        .next()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

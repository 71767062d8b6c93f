//! HTTP server setup for the repository.
//!
//! Repository paths have arbitrary depth, so a single fallback handler receives
//! every request and dispatches on the method. The synchronous repository work
//! runs on the blocking thread pool.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    events::TracingSink,
    handlers::{self, RepoResponse},
    state::AppState,
};

/// `Last-Modified` value in IMF-fixdate form.
pub fn http_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Build the application router around `state`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.config.max_upload_size_bytes()).unwrap_or(usize::MAX);
    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Response> {
    let path = uri.path().to_string();
    match method {
        Method::GET | Method::HEAD => {
            run_blocking(state, move |state| handlers::handle_get(state, &path)).await
        }
        Method::PUT => {
            let body = body.map_err(|rejection| {
                if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::UploadError(rejection.body_text())
                } else {
                    AppError::BadRequest(rejection.body_text())
                }
            })?;
            run_blocking(state, move |state| {
                handlers::handle_put(state, &path, &body)
            })
            .await
        }
        _ => Err(AppError::MethodNotAllowed("Method not allowed".to_string())),
    }
}

async fn run_blocking<F>(state: Arc<AppState>, work: F) -> AppResult<Response>
where
    F: FnOnce(&AppState) -> AppResult<RepoResponse> + Send + 'static,
{
    let response = tokio::task::spawn_blocking(move || work(&state))
        .await
        .map_err(|e| AppError::InternalError(format!("Request task failed: {}", e)))??;
    Ok(into_http(response))
}

fn into_http(response: RepoResponse) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(response.content_type),
    );
    if let Some(last_modified) = response.last_modified {
        if let Ok(value) = HeaderValue::from_str(&http_date(last_modified)) {
            headers.insert(header::LAST_MODIFIED, value);
        }
    }
    (response.status, headers, response.body).into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    info!("Shutdown signal received");
}

/// Open the configured repository and serve it until interrupted.
pub async fn run_server(config: Config) -> Result<()> {
    info!("Starting Maven repository server");
    let host = config.server.host.clone();
    let port = config.server.port;
    let root = config.storage.root.clone();

    let state = AppState::from_config(config, Arc::new(TracingSink)).map_err(|e| {
        error!(root = %root.display(), error = %e, "Failed to open repository storage");
        anyhow::anyhow!("Failed to open repository at {}: {}", root.display(), e)
    })?;

    let repository = Arc::clone(&state.repository);
    let indexed = tokio::task::spawn_blocking(move || repository.scan()).await??;
    info!(root = %root.display(), indexed, "Initial scan complete");
    let mount = if state.base.is_empty() { "/".to_string() } else { state.base.clone() };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse().map_err(|e| {
        error!(host = %host, port = %port, error = %e, "Invalid socket address");
        anyhow::anyhow!("Invalid socket address {}:{}: {}", host, port, e)
    })?;

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        error!(addr = %addr, error = %e, "Failed to bind to address");
        anyhow::anyhow!("Failed to bind to {}:{}: {}", host, port, e)
    })?;

    println!("✅ Maven repository is running on http://{}:{}{}", host, port, mount);
    println!("📂 Repository root: {}", root.display());
    println!("📦 Indexed artifacts: {}", indexed);

    info!("Server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            anyhow::anyhow!("Server error: {}", e)
        })?;

    Ok(())
}

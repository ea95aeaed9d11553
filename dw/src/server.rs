//! Preview server
//!
//! Serves already-rendered output over HTTP. It only starts once compilation
//! has finished, so it never sees registry or scope state.

use std::path::{Path, PathBuf};

use axum::Router;
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::ServerConfig;

/// Directory to serve: the configured one, else the output's directory
pub fn public_dir(config: &ServerConfig, output: &Path) -> PathBuf {
    if let Some(dir) = &config.public_dir {
        return dir.clone();
    }
    match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Static file router for `dir`
pub fn router(dir: &Path) -> Router {
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(TraceLayer::new_for_http())
}

/// Bind `host:port` and serve `dir` until the process is stopped
pub async fn serve(config: &ServerConfig, dir: &Path) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!(%addr, ?dir, "serve: called");
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    eprintln!("listening on http://{}/", addr);
    serve_on(listener, dir).await
}

/// Serve `dir` on an already-bound listener
pub async fn serve_on(listener: TcpListener, dir: &Path) -> Result<()> {
    info!("Serving {} on {}", dir.display(), listener.local_addr()?);
    axum::serve(listener, router(dir)).await.context("Preview server failed")?;
    Ok(())
}

//! HTTP API for differing. Every route lives under `/api` and speaks JSON,
//! errors included.

mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use differing_core::RepoService;
use tokio::net::TcpListener;

pub use error::{ApiError, ErrorBody, status_for};
pub use handlers::{AmendRequest, AmendResponse, RepoInfo, SaveRequest, SaveResponse};

/// Headroom for JSON framing and escaping around a file body.
const BODY_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(service: Arc<RepoService>) -> Router {
    // A save may carry anything we would be willing to read back.
    let body_limit = service
        .files()
        .max_read_bytes()
        .saturating_mul(2)
        .saturating_add(BODY_OVERHEAD_BYTES);

    let api = Router::new()
        .route("/repo-info", get(handlers::repo_info))
        .route("/diffs", get(handlers::list_diffs))
        .route("/diffs/{id}/files", get(handlers::list_files))
        .route("/diffs/{id}/commits", get(handlers::list_commits))
        .route("/file-diff/{id}/{*path}", get(handlers::file_diff))
        .route("/file-save/{id}/{*path}", post(handlers::file_save))
        .route("/commit/{id}/amend-message", post(handlers::amend_message));

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(service)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    service: Arc<RepoService>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::server::endpoints::{catalog, job, page, status};
use crate::types::AppState;

mod endpoints;
mod types;

/// Creates a router that can be used by `axum`.
///
/// # Parameters
/// - `app_state`: The app server state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/states", get(catalog::get_states))
        .route("/districts/:state_id", get(catalog::get_districts))
        .route("/start", post(job::post_start))
        .route("/status", get(job::get_status))
        .route("/stop", post(job::post_stop))
        .route("/download", get(job::get_download));

    Router::new()
        .route("/", get(page::get_index))
        .route("/health", get(status::get_health))
        .nest("/api", api_router)
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Serves the API until Ctrl-C.
pub async fn serve(app_state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let router = create_router(app_state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}

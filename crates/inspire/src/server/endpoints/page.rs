use axum::response::Html;
use tracing::info;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// GET /
///
/// The interactive page for picking a state and districts and following a run.
pub async fn get_index() -> Html<&'static str> {
    info!("GET /");
    Html(INDEX_HTML)
}

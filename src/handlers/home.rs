use axum::response::Html;

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// Handler for GET /
pub async fn home() -> Html<&'static str> {
    Html(INDEX_HTML)
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
};

use crate::{error::ErrorServer, state::ServerState};

pub const INDEX_TEMPLATE: &str = "index.html";

#[utoipa::path(
    get,
    path = "/ui",
    description = "Render the summarization page",
    responses(
        (status = 200, description = "HTML page", body = String, content_type = "text/html"),
        (status = 404, description = "Template not found"),
    )
)]
pub async fn ui_page(
    State(server_state): State<Arc<ServerState>>,
) -> Result<Html<String>, ErrorServer> {
    let path = server_state.templates_dir().join(INDEX_TEMPLATE);

    let page = tokio::fs::read_to_string(&path).await.map_err(|e| {
        log::error!("Cannot read template {}: {}", path.display(), e);
        ErrorServer {
            status: StatusCode::NOT_FOUND.into(),
            message: format!("Template {} not available", INDEX_TEMPLATE),
        }
    })?;

    Ok(Html(page))
}

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use crate::{
    docs::{dto::ApiDoc, handler::api_docs},
    health::handler::health,
    predict::handler::predict,
    root::handler::index,
    state::ServerState,
    train::handler::{get_training_job, list_training_jobs, start_training_job, train},
    ui::handler::ui_page,
};

pub fn router(state: Arc<ServerState>) -> Router {
    let doc = ApiDoc::openapi();

    Router::new()
        .merge(Redoc::with_url("/docs", doc))
        .route("/", get(index))
        .route("/api-docs/openapi.json", get(api_docs))
        .route("/ui", get(ui_page))
        .route("/train", get(train))
        .route(
            "/train/jobs",
            get(list_training_jobs).post(start_training_job),
        )
        .route("/train/jobs/{id}", get(get_training_job))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

use axum::response::Redirect;

#[utoipa::path(
    get,
    path = "/",
    tag = "root",
    description = "Redirect to the API documentation",
    responses(
        (status = 307, description = "Redirect to /docs"),
    )
)]
pub async fn index() -> Redirect {
    Redirect::temporary("/docs")
}

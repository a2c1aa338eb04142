use axum::routing::get;
use serde_json::json;

use crate::{envelope::ApiResponse, Router};

#[utoipa::path(
    get,
    path = "/api/v1/healthcheck",
    tag = "healthcheck",
    responses(
        (status = 200, description = "The server is up")
    )
)]
async fn healthcheck() -> ApiResponse<serde_json::Value> {
    ApiResponse::ok(json!({}), "OK")
}

pub fn router() -> Router {
    Router::new().route("/", get(healthcheck))
}

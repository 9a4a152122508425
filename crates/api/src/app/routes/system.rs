use axum::{http::StatusCode, response::IntoResponse, Json};

use crate::app::dto::ApiResponse;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::message("ok")))
}

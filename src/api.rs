//! HTTP surface
//!
//! Thin axum layer over the executor. Execution outcomes are always reported
//! in-band with status 200; only malformed requests are rejected by axum's
//! extractors.

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::executor::{ExecutionRequest, ExecutionResult, Executor};
use crate::languages::Language;

#[derive(Debug, Serialize)]
struct LanguagesResponse {
    languages: Vec<&'static str>,
}

pub fn router(executor: Executor) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/execute", post(execute))
        .route("/languages", get(languages))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(executor)
}

async fn execute(
    State(executor): State<Executor>,
    Json(request): Json<ExecutionRequest>,
) -> Json<ExecutionResult> {
    Json(executor.execute(&request).await)
}

async fn languages() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: Language::all().iter().map(Language::name).collect(),
    })
}

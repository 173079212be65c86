//! # Gateway API
//!
//! Everything under `/api`.

pub mod generate;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};
use weavewiki_core::gateway::wire::{ErrorBody, GatewayRequest, TextEnvelope};

use crate::SharedState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// False when the server was started without an API key
    pub credential_configured: bool,
    pub upstream: String,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Weavewiki API",
        version = "1.0.0",
        description = "Credential-hiding gateway for the Weavewiki encyclopedia"
    ),
    paths(generate::generate, health),
    components(schemas(GatewayRequest, TextEnvelope, ErrorBody, HealthResponse)),
    tags(
        (name = "generate", description = "Text generation"),
        (name = "health", description = "Liveness and configuration")
    )
)]
pub struct ApiDoc;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/generate", post(generate::generate))
        .route("/health", get(health))
        .route("/openapi.json", get(serve_openapi))
}

/// Liveness and credential status
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Server is up", body = HealthResponse)
    )
)]
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        credential_configured: state.config.has_credential(),
        upstream: state.config.upstream_url.clone(),
    })
}

async fn serve_openapi() -> Response {
    let spec = ApiDoc::openapi().to_json().unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json")], spec).into_response()
}

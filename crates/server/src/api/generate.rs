//! # Generate API
//!
//! `POST /api/generate`: attaches the server-held credential and relays the
//! upstream answer as JSON or as a chunked plain-text stream.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::TryStreamExt;
use weavewiki_core::gateway::wire::{codes, ErrorBody, GatewayRequest, TextEnvelope};

use crate::SharedState;

const MISSING_KEY_MESSAGE: &str =
    "The server has no API key configured. Set GEMINI_API_KEY and restart it.";

/// Model names become an upstream path segment, so only `[A-Za-z0-9._-]+` passes.
pub fn is_model_name(model: &str) -> bool {
    !model.is_empty()
        && model
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn failure(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(message, code))).into_response()
}

/// Generate text for a prompt
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "generate",
    request_body = GatewayRequest,
    responses(
        (status = 200, description = "Generated text; plain-text chunks when `stream` is true",
            content(
                (TextEnvelope = "application/json"),
                (String = "text/plain")
            )
        ),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 401, description = "API key rejected upstream", body = ErrorBody),
        (status = 502, description = "Upstream failure", body = ErrorBody),
        (status = 503, description = "No API key configured", body = ErrorBody)
    )
)]
pub async fn generate(
    State(state): State<SharedState>,
    payload: Result<Json<GatewayRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return failure(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, rejection.body_text())
        }
    };

    if !is_model_name(&request.model) {
        return failure(
            StatusCode::BAD_REQUEST,
            codes::BAD_REQUEST,
            "`model` must be a bare model name (letters, digits, '.', '_', '-')",
        );
    }

    let Some(api_key) = state.config.api_key.as_deref() else {
        return failure(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::MISSING_CREDENTIAL,
            MISSING_KEY_MESSAGE,
        );
    };

    tracing::debug!(model = %request.model, stream = request.stream, "Forwarding generate request");

    if !request.stream {
        return match state.upstream.generate(api_key, &request).await {
            Ok(text) => Json(TextEnvelope { text }).into_response(),
            Err(e) => {
                tracing::warn!(model = %request.model, "Upstream call failed: {}", e);
                e.into_response()
            }
        };
    }

    match state.upstream.stream(api_key, &request).await {
        Ok(fragments) => {
            let model = request.model.clone();
            let body = fragments.inspect_err(move |e| {
                tracing::warn!(model = %model, "Upstream stream failed: {}", e);
            });
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(body),
            )
                .into_response()
        }
        Err(e) => {
            tracing::warn!(model = %request.model, "Upstream stream rejected: {}", e);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_name_rules() {
        assert!(is_model_name("gemini-2.5-flash-lite"));
        assert!(is_model_name("m_1.0"));
        assert!(!is_model_name(""));
        assert!(!is_model_name("../../v1beta/tunedModels/x:delete?"));
        assert!(!is_model_name("gemini:streamGenerateContent"));
        assert!(!is_model_name("models/gemini"));
        assert!(!is_model_name("gemini%2F.."));
    }
}

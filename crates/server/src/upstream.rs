//! # Upstream Client
//!
//! Forwards gateway requests to the generative-language API with the
//! server-held credential attached, and reduces its responses to text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use weavewiki_core::gateway::wire::{codes, ErrorBody, GatewayRequest};
use weavewiki_core::gateway::Utf8Decoder;

use crate::config::ServerConfig;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Upstream request failed: {0}")]
    Transport(String),

    #[error("The API key was rejected by the upstream service: {0}")]
    Credential(String),

    #[error("Upstream error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Upstream returned no content: {0}")]
    Empty(String),
}

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            UpstreamError::Credential(_) => (StatusCode::UNAUTHORIZED, codes::INVALID_CREDENTIAL),
            UpstreamError::Status { status, .. } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                codes::UPSTREAM_ERROR,
            ),
            UpstreamError::Transport(_) | UpstreamError::Empty(_) => {
                (StatusCode::BAD_GATEWAY, codes::UPSTREAM_ERROR)
            }
        };
        (status, Json(ErrorBody::new(self.to_string(), code))).into_response()
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    timeout: std::time::Duration,
}

impl UpstreamClient {
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: config.upstream_url.clone(),
            timeout: config.upstream_timeout,
        })
    }

    fn endpoint(&self, model: &str, streaming: bool) -> String {
        if streaming {
            format!(
                "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
                self.base_url, model
            )
        } else {
            format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
        }
    }

    async fn send(
        &self,
        api_key: &str,
        request: &GatewayRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, UpstreamError> {
        let mut builder = self
            .http
            .post(self.endpoint(&request.model, streaming))
            .header("x-goog-api-key", api_key)
            .json(&upstream_body(request));
        if !streaming {
            builder = builder.timeout(self.timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }

    /// Single-shot generation, reduced to the candidate text
    pub async fn generate(
        &self,
        api_key: &str,
        request: &GatewayRequest,
    ) -> Result<String, UpstreamError> {
        let response = self.send(api_key, request, false).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        match candidate_text(&body) {
            Some(text) => Ok(text),
            None => Err(UpstreamError::Empty(block_reason(&body))),
        }
    }

    /// Streaming generation as plain text fragments
    pub async fn stream(
        &self,
        api_key: &str,
        request: &GatewayRequest,
    ) -> Result<impl Stream<Item = Result<String, UpstreamError>> + Send + 'static, UpstreamError>
    {
        let response = self.send(api_key, request, true).await?;
        let body = Box::pin(response.bytes_stream());

        let fragments = stream::unfold(
            (body, SseTextParser::default(), false),
            |(mut body, mut parser, done)| async move {
                if done {
                    return None;
                }
                loop {
                    let batch = match body.next().await {
                        Some(Ok(chunk)) => parser.push(&chunk),
                        Some(Err(e)) => Err(UpstreamError::Transport(e.to_string())),
                        None => {
                            let rest = parser.finish();
                            return match rest {
                                Ok(texts) if texts.is_empty() => None,
                                other => Some((other, (body, parser, true))),
                            };
                        }
                    };
                    match batch {
                        Ok(texts) if texts.is_empty() => continue,
                        Ok(texts) => return Some((Ok(texts), (body, parser, false))),
                        Err(e) => return Some((Err(e), (body, parser, true))),
                    }
                }
            },
        );

        Ok(fragments.flat_map(|batch| {
            let items: Vec<Result<String, UpstreamError>> = match batch {
                Ok(texts) => texts.into_iter().map(Ok).collect(),
                Err(e) => vec![Err(e)],
            };
            stream::iter(items)
        }))
    }
}

/// Gateway body → upstream `generateContent` body
fn upstream_body(request: &GatewayRequest) -> Value {
    let contents = match &request.contents {
        Value::String(prompt) => json!([{ "role": "user", "parts": [{ "text": prompt }] }]),
        other => other.clone(),
    };

    let mut body = json!({ "contents": contents });
    if let Some(config) = &request.config {
        body["generationConfig"] = config.clone();
    }
    body
}

/// Concatenated text parts of the first candidate
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    Some(
        parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
    )
}

fn block_reason(body: &Value) -> String {
    body.pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
        .map(|reason| format!("prompt blocked ({})", reason))
        .unwrap_or_else(|| "no candidates".to_string())
}

fn upstream_message(body: &Value) -> Option<String> {
    body.pointer("/error/message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

async fn rejection(response: reqwest::Response) -> UpstreamError {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = upstream_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());

    let key_problem = matches!(status.as_u16(), 401 | 403)
        || (status.as_u16() == 400 && message.contains("API key"));

    if key_problem {
        UpstreamError::Credential(message)
    } else {
        UpstreamError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

/// Incremental parser for the upstream's `alt=sse` body.
///
/// Each `data:` line holds one JSON chunk; only its text parts are kept.
#[derive(Debug, Default)]
pub struct SseTextParser {
    decoder: Utf8Decoder,
    line: String,
}

impl SseTextParser {
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, UpstreamError> {
        let decoded = self.decoder.push(chunk);
        let mut texts = Vec::new();

        for ch in decoded.chars() {
            if ch == '\n' {
                let line = std::mem::take(&mut self.line);
                if let Some(text) = Self::parse_line(&line)? {
                    texts.push(text);
                }
            } else {
                self.line.push(ch);
            }
        }
        Ok(texts)
    }

    pub fn finish(&mut self) -> Result<Vec<String>, UpstreamError> {
        if let Some(rest) = self.decoder.finish() {
            self.line.push_str(&rest);
        }
        let line = std::mem::take(&mut self.line);
        Ok(Self::parse_line(&line)?.into_iter().collect())
    }

    fn parse_line(line: &str) -> Result<Option<String>, UpstreamError> {
        let Some(data) = line.trim_end_matches('\r').strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            return Ok(None);
        }

        let chunk: Value = serde_json::from_str(data)
            .map_err(|e| UpstreamError::Transport(format!("bad stream chunk: {}", e)))?;

        if let Some(message) = upstream_message(&chunk) {
            return Err(UpstreamError::Status {
                status: 502,
                message,
            });
        }

        Ok(candidate_text(&chunk).filter(|text| !text.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sse(text: &str) -> String {
        format!(
            "data: {}\r\n\r\n",
            json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] })
        )
    }

    #[test]
    fn test_string_contents_wrapped_as_user_turn() {
        let request = GatewayRequest {
            model: "m".to_string(),
            contents: json!("Define: Loom"),
            config: Some(json!({ "thinkingConfig": { "thinkingBudget": 0 } })),
            stream: false,
        };
        let body = upstream_body(&request);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Define: Loom");
        assert_eq!(body["generationConfig"]["thinkingConfig"]["thinkingBudget"], 0);
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let body = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }] } }]
        });
        assert_eq!(candidate_text(&body).as_deref(), Some("Hello"));
        assert_eq!(candidate_text(&json!({})), None);
    }

    #[test]
    fn test_sse_parser_across_chunk_boundaries() {
        let payload = format!("{}{}", sse("Hel"), sse("lo"));
        let bytes = payload.as_bytes();
        let split = bytes.len() / 3;

        let mut parser = SseTextParser::default();
        let mut texts = parser.push(&bytes[..split]).unwrap();
        texts.extend(parser.push(&bytes[split..]).unwrap());
        texts.extend(parser.finish().unwrap());
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_sse_parser_surfaces_error_chunk() {
        let mut parser = SseTextParser::default();
        let err = parser
            .push(b"data: {\"error\":{\"message\":\"quota exceeded\"}}\n")
            .unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_credential_error_maps_to_401() {
        let response = UpstreamError::Credential("API key not valid".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_block_reason() {
        let body = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        assert_eq!(block_reason(&body), "prompt blocked (SAFETY)");
    }
}

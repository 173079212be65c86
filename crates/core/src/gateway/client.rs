//! # Gateway Client
//!
//! Explicitly constructed HTTP client for the proxy. One instance is built
//! at startup and shared by everything that needs the gateway.

use super::utf8::Utf8Decoder;
use super::wire::{codes, ErrorBody, GatewayRequest, TextEnvelope};
use crate::config::ExplorerConfig;
use crate::error::ContentError;
use futures::stream::{self, BoxStream, StreamExt};
use std::time::Duration;

/// Lazily consumed definition text, in delivery order
pub type TextStream = BoxStream<'static, Result<String, ContentError>>;

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
    request_timeout: Duration,
}

impl GatewayClient {
    /// Build a client for the gateway configured in `config`
    pub fn new(config: &ExplorerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self {
            http,
            url: config.gateway_url.clone(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Single-shot call; returns the envelope's `text`.
    pub async fn generate(&self, request: &GatewayRequest) -> Result<String, ContentError> {
        let response = self
            .http
            .post(&self.url)
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let envelope: TextEnvelope = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ContentError::Timeout(self.request_timeout)
            } else {
                ContentError::Decode(e.to_string())
            }
        })?;
        Ok(envelope.text)
    }

    /// Streaming call. Only the connection is time-limited; the body
    /// may take as long as the upstream keeps producing.
    pub async fn stream(&self, request: &GatewayRequest) -> Result<TextStream, ContentError> {
        let mut request = request.clone();
        request.stream = true;

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = Box::pin(response.bytes_stream());
        let text = stream::unfold(
            (body, Utf8Decoder::default(), false),
            |(mut body, mut decoder, done)| async move {
                if done {
                    return None;
                }
                loop {
                    match body.next().await {
                        Some(Ok(chunk)) => {
                            let text = decoder.push(&chunk);
                            if !text.is_empty() {
                                return Some((Ok(text), (body, decoder, false)));
                            }
                        }
                        Some(Err(e)) => {
                            let err = ContentError::Unreachable(e.to_string());
                            return Some((Err(err), (body, decoder, true)));
                        }
                        None => {
                            return decoder
                                .finish()
                                .map(|rest| (Ok(rest), (body, Utf8Decoder::default(), true)));
                        }
                    }
                }
            },
        );

        Ok(text.boxed())
    }

    fn transport_error(&self, err: reqwest::Error) -> ContentError {
        if err.is_timeout() {
            ContentError::Timeout(self.request_timeout)
        } else {
            ContentError::Unreachable(err.to_string())
        }
    }
}

/// Map a non-2xx gateway response onto the error taxonomy.
async fn error_from_response(response: reqwest::Response) -> ContentError {
    let status = response.status().as_u16();
    let body = response
        .json::<ErrorBody>()
        .await
        .unwrap_or_else(|_| ErrorBody {
            error: "Unknown server error".to_string(),
            code: None,
        });

    match body.code.as_deref() {
        Some(codes::MISSING_CREDENTIAL) => ContentError::MissingCredential,
        Some(codes::INVALID_CREDENTIAL) => ContentError::InvalidCredential(body.error),
        _ => ContentError::Server {
            status,
            message: body.error,
        },
    }
}

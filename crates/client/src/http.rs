//! HTTP client for the inline-agent service.
//!
//! Each turn is one `POST {endpoint}/agents/{sessionId}` carrying the
//! camelCase JSON request. The service answers with a server-sent-event
//! stream that a spawned task decodes into [`AgentEvent`]s.
//!
//! [`AgentEvent`]: handback_core::client::AgentEvent

use async_trait::async_trait;
use futures::StreamExt;
use handback_config::ClientConfig;
use handback_core::client::{AgentClient, EventReceiver, InvokeInlineAgentRequest};
use handback_core::error::TransportError;
use std::time::Duration;
use tracing::{debug, trace, warn};
use crate::sse::{Decoded, LineBuffer, data_field, decode_data};

/// Capacity of the per-turn event channel.
const EVENT_BUFFER: usize = 64;

/// A streaming HTTP [`AgentClient`].
pub struct HttpAgentClient {
    name: String,
    base_url: reqwest::Url,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl HttpAgentClient {
    /// Create a new client for `base_url`.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::NotConfigured(format!("HTTP client: {e}")))?;

        let base_url = base_url.into();
        let base_url = reqwest::Url::parse(base_url.trim())
            .map_err(|e| TransportError::NotConfigured(format!("endpoint '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::NotConfigured(format!(
                "endpoint '{base_url}' cannot carry a path"
            )));
        }

        Ok(Self {
            name: name.into(),
            base_url,
            api_key,
            client,
        })
    }

    /// Build a client from the `[client]` config section.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::new(
            "http",
            &config.endpoint,
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// `{endpoint}/agents/{sessionId}`, with the session id encoded as one
    /// path segment so it reaches the service unchanged.
    fn turn_url(&self, session_id: &str) -> Result<reqwest::Url, TransportError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::NotConfigured("endpoint cannot carry a path".into()))?
            .pop_if_empty()
            .push("agents")
            .push(session_id);
        Ok(url)
    }
}

#[async_trait]
impl AgentClient for HttpAgentClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke_inline_agent(
        &self,
        request: InvokeInlineAgentRequest,
    ) -> Result<EventReceiver, TransportError> {
        let url = self.turn_url(request.session_id.as_str())?;

        debug!(
            client = %self.name,
            model = %request.foundation_model,
            session_id = %request.session_id,
            has_input = request.input_text.is_some(),
            "Sending inline agent request"
        );

        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(e.to_string())
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(TransportError::RateLimited { retry_after_secs });
        }

        if status == 401 || status == 403 {
            return Err(TransportError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Agent service error");
            return Err(TransportError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(EVENT_BUFFER);
        let client_name = self.name.clone();

        // Spawn task to read the SSE byte stream and decode events
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut lines = LineBuffer::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(TransportError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    let Some(data) = data_field(&line) else {
                        continue;
                    };

                    match decode_data(data) {
                        Ok(Decoded::Event(event)) => {
                            if tx.send(Ok(event)).await.is_err() {
                                return; // receiver dropped
                            }
                        }
                        Ok(Decoded::Ignored) => {
                            trace!(client = %client_name, data = %data, "Ignoring SSE event");
                        }
                        Ok(Decoded::Done) => return,
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            trace!(client = %client_name, "Event stream closed by service");
        });

        Ok(rx)
    }
}

//! Client side of the `POST /completion` relay.
//!
//! Lets a front end reach the model through the API server instead of
//! holding provider credentials itself.

use crate::llm_client::{CompletionClient, CompletionKind, GatewayError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Serialize)]
struct RelayRequest<'a> {
    prompt: &'a str,
    #[serde(rename = "type")]
    kind: CompletionKind,
}

#[derive(Deserialize)]
struct RelayResponse {
    response: String,
}

#[derive(Deserialize)]
struct RelayErrorBody {
    error: String,
}

/// Forwards completions to a running API server.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RelayClient {
    /// `server_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                GatewayError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            http,
            endpoint: format!("{}/completion", server_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CompletionClient for RelayClient {
    async fn complete(&self, prompt: &str, kind: CompletionKind) -> Result<String, GatewayError> {
        debug!(%kind, endpoint = %self.endpoint, "Relaying completion request");
        let response = self
            .http
            .post(&self.endpoint)
            .json(&RelayRequest { prompt, kind })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: RelayResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;
            return Ok(body.response);
        }

        let message = response
            .json::<RelayErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_else(|_| format!("Request failed: {}", status.as_u16()));
        warn!(status = %status, error = %message, "Relay returned an error");

        if status.as_u16() == 401 {
            Err(GatewayError::InvalidCredentials)
        } else {
            Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            })
        }
    }
}

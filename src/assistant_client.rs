use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::{ClientConfig, ConfigError};

pub const ANALYZE_PATH: &str = "analyze";
pub const VISUALIZE_PATH: &str = "visualize-products";

/// Why a single request to the assistant service did not produce a result.
#[derive(Debug, Error)]
pub enum RequestFailure {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("service responded with {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
#[error("analysis failed: {0}")]
pub struct AnalysisError(#[from] pub RequestFailure);

#[derive(Debug, Error)]
#[error("visualization failed: {0}")]
pub struct VisualizationError(#[from] pub RequestFailure);

/// The two remote operations the chat issues. Each call is a single attempt.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Returns the answer text exactly as the service sent it.
    async fn analyze(&self, question: &str) -> Result<String, AnalysisError>;

    /// Returns a URL for the generated image.
    async fn visualize(&self, prompt: &str) -> Result<String, VisualizationError>;
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    answer: String,
}

#[derive(Serialize)]
struct VisualizeRequest<'a> {
    description: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisualizeResponse {
    image_url: String,
}

pub struct AssistantClient {
    client: reqwest::Client,
    analyze_url: Url,
    visualize_url: Url,
}

impl AssistantClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: reqwest::Client::new(),
            analyze_url: config.endpoint(ANALYZE_PATH)?,
            visualize_url: config.endpoint(VISUALIZE_PATH)?,
        })
    }

    async fn post_json<B, T>(&self, url: &Url, body: &B) -> Result<T, RequestFailure>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RequestFailure::Transport(e.to_string()))?;

        debug!("Response from {} ({}): {}", url, status, text);

        if !status.is_success() {
            error!("Request to {} failed with status {}", url, status);
            return Err(RequestFailure::Status {
                status,
                message: failure_message(status, &text),
            });
        }

        serde_json::from_str(&text).map_err(|e| RequestFailure::Decode(e.to_string()))
    }
}

#[async_trait]
impl AssistantService for AssistantClient {
    async fn analyze(&self, question: &str) -> Result<String, AnalysisError> {
        let response: AnalyzeResponse = self
            .post_json(&self.analyze_url, &AnalyzeRequest { question })
            .await?;
        Ok(response.answer)
    }

    async fn visualize(&self, prompt: &str) -> Result<String, VisualizationError> {
        let response: VisualizeResponse = self
            .post_json(&self.visualize_url, &VisualizeRequest { description: prompt })
            .await?;
        Ok(response.image_url)
    }
}

/// The service has no error schema; use its `message` or `error` field when
/// the body happens to be JSON, otherwise the raw body.
fn failure_message(status: StatusCode, body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
        ["message", "error"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str).map(str::to_string))
    });

    match from_json {
        Some(message) => message,
        None if !body.trim().is_empty() => body.trim().to_string(),
        None => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
    }
}

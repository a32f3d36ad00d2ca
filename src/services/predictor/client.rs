use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::provider::Predictor;
use crate::config::Config;
use crate::error::InferenceError;
use crate::inference::chunk::Chunk;

#[derive(Deserialize)]
struct PredictionResponse {
    seconds: Vec<serde_json::Value>,
}

/// Parses `{ "seconds": number[] }`. Any other shape, or a non-finite
/// entry, is a malformed response.
pub fn parse_prediction_body(body: &str) -> Result<Vec<f64>, InferenceError> {
    let response: PredictionResponse = serde_json::from_str(body)
        .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

    response
        .seconds
        .iter()
        .enumerate()
        .map(|(i, value)| match value.as_f64() {
            Some(t) if t.is_finite() => Ok(t),
            _ => Err(InferenceError::MalformedResponse(format!(
                "seconds[{i}] is not a finite number: {value}"
            ))),
        })
        .collect()
}

/// Posts each chunk as a multipart WAV upload to a prediction endpoint.
#[derive(Clone)]
pub struct HttpPredictor {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(timeout) // HARD timeout at the network level
            .build()
            .map_err(|e| InferenceError::Network(format!("http client setup failed: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, InferenceError> {
        Self::new(config.inference_url.clone(), config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Predictor for HttpPredictor {
    fn name(&self) -> &str {
        "http"
    }

    async fn predict(&self, chunk: &Chunk) -> Result<Vec<f64>, InferenceError> {
        let part = Part::bytes(chunk.audio.bytes().to_vec())
            .file_name(chunk.file_name())
            .mime_str("audio/wav")
            .map_err(|e| InferenceError::Network(e.to_string()))?;
        let form = Form::new().part("file", part);

        debug!(
            chunk = chunk.index,
            bytes = chunk.audio.len(),
            endpoint = %self.endpoint,
            "posting chunk"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.timeout)
                } else {
                    InferenceError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout(self.timeout)
            } else {
                InferenceError::Network(e.to_string())
            }
        })?;
        parse_prediction_body(&body)
    }
}

//! Ollama vision OCR engine
//!
//! Sends the receipt image to a local vision model and asks for a verbatim
//! transcription. The transcription then goes through the same text parser as
//! any other engine's output.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::OcrEngine;

const TRANSCRIBE_PROMPT: &str = "Transcribe all text on this receipt exactly as printed, \
line by line. Keep item names, quantities, prices, dates and totals on their original lines. \
Output only the transcription.";

#[derive(Clone)]
pub struct OllamaOcr {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaOcr {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env(default_model: &str, timeout: Duration) -> Option<Self> {
        let host = std::env::var("OLLAMA_HOST").ok()?;
        let model =
            std::env::var("OLLAMA_VISION_MODEL").unwrap_or_else(|_| default_model.to_string());
        Some(Self::new(&host, &model, timeout))
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

/// Request to Ollama API with images (for vision models)
#[derive(Debug, Serialize)]
struct OllamaVisionRequest {
    model: String,
    prompt: String,
    images: Vec<String>,
    stream: bool,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl OcrEngine for OllamaOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        if image.is_empty() {
            return Err(Error::Ocr("no image data".into()));
        }

        let request = OllamaVisionRequest {
            model: self.model.clone(),
            prompt: TRANSCRIBE_PROMPT.to_string(),
            images: vec![base64::engine::general_purpose::STANDARD.encode(image)],
            stream: false,
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let ollama_response: OllamaResponse = response.json().await?;
        debug!(
            model = %self.model,
            chars = ollama_response.response.len(),
            "Ollama transcription received"
        );

        Ok(ollama_response.response.trim().to_string())
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

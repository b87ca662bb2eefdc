//! Pluggable OCR engines
//!
//! The receipt parser only ever sees text; turning an image into text is the
//! job of an external engine behind the `OcrEngine` trait.
//!
//! # Architecture
//!
//! - `OcrEngine` trait: the interface every engine implements
//! - `OcrClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Engines: `TesseractOcr` (local binary), `OllamaOcr` (vision model), `MockOcr`
//!
//! # Configuration
//!
//! The `[ocr]` config section picks the engine. Environment variables win:
//! - `OCR_BACKEND`: tesseract, ollama, or mock
//! - `OLLAMA_HOST`: Ollama server URL (required for the ollama engine)
//! - `OLLAMA_VISION_MODEL`: overrides `ocr.ollama_model`

mod mock;
mod ollama;
mod tesseract;

pub use mock::MockOcr;
pub use ollama::OllamaOcr;
pub use tesseract::TesseractOcr;

use async_trait::async_trait;

use crate::config::{OcrBackendKind, OcrConfig};
use crate::error::Result;

/// Interface for turning a receipt image into raw text
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Extract all text from an image (PNG, JPEG, ...)
    async fn extract_text(&self, image: &[u8]) -> Result<String>;

    /// Check if the engine is available
    async fn health_check(&self) -> bool;

    /// Engine name (for logging)
    fn name(&self) -> &str;
}

/// Concrete OCR client enum
#[derive(Clone)]
pub enum OcrClient {
    Tesseract(TesseractOcr),
    Ollama(OllamaOcr),
    Mock(MockOcr),
}

impl OcrClient {
    /// Create a client from config, letting `OCR_BACKEND` override the engine
    ///
    /// Returns None when the chosen engine is missing required settings
    /// (the Ollama engine without `OLLAMA_HOST`).
    pub fn from_config(config: &OcrConfig) -> Option<Self> {
        let backend = match std::env::var("OCR_BACKEND") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(backend = %value, "Unknown OCR_BACKEND, using configured engine");
                config.backend
            }),
            Err(_) => config.backend,
        };

        match backend {
            OcrBackendKind::Tesseract => Some(OcrClient::Tesseract(TesseractOcr::new(
                &config.tesseract_cmd,
                config.timeout(),
            ))),
            OcrBackendKind::Ollama => {
                OllamaOcr::from_env(&config.ollama_model, config.timeout()).map(OcrClient::Ollama)
            }
            OcrBackendKind::Mock => Some(OcrClient::Mock(MockOcr::default())),
        }
    }

    /// Create a mock client that always returns `text`
    pub fn mock(text: &str) -> Self {
        OcrClient::Mock(MockOcr::new(text))
    }
}

#[async_trait]
impl OcrEngine for OcrClient {
    async fn extract_text(&self, image: &[u8]) -> Result<String> {
        match self {
            OcrClient::Tesseract(e) => e.extract_text(image).await,
            OcrClient::Ollama(e) => e.extract_text(image).await,
            OcrClient::Mock(e) => e.extract_text(image).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            OcrClient::Tesseract(e) => e.health_check().await,
            OcrClient::Ollama(e) => e.health_check().await,
            OcrClient::Mock(e) => e.health_check().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            OcrClient::Tesseract(e) => e.name(),
            OcrClient::Ollama(e) => e.name(),
            OcrClient::Mock(e) => e.name(),
        }
    }
}

//! Mock OCR engine for testing

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::OcrEngine;

/// Returns the same text for every image
#[derive(Clone)]
pub struct MockOcr {
    pub text: String,
    /// Whether health_check should return true
    pub healthy: bool,
}

impl Default for MockOcr {
    fn default() -> Self {
        Self::new("TOTAL 0.00")
    }
}

impl MockOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            healthy: true,
        }
    }

    /// Create an unhealthy mock whose extraction always fails
    pub fn unhealthy() -> Self {
        Self {
            text: String::new(),
            healthy: false,
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn extract_text(&self, _image: &[u8]) -> Result<String> {
        if !self.healthy {
            return Err(Error::Ocr("mock OCR engine is unavailable".into()));
        }
        Ok(self.text.clone())
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn name(&self) -> &str {
        "mock"
    }
}

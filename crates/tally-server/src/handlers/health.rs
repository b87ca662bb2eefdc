//! Health check handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use tally_core::{MarketDataProvider, OcrEngine};

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ocr_backend: Option<String>,
    pub ocr_available: bool,
    pub market_provider: Option<String>,
    pub pending_reviews: usize,
}

/// GET /health - Service status and configured collaborators
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let ocr_available = match &state.ocr {
        Some(ocr) => ocr.health_check().await,
        None => false,
    };

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        ocr_backend: state.ocr.as_ref().map(|o| o.name().to_string()),
        ocr_available,
        market_provider: state.market.as_ref().map(|m| m.name().to_string()),
        pending_reviews: state.review.len(),
    })
}
